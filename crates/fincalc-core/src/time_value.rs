use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::FinCalcError;
use crate::types::{Money, Percent, Rate};
use crate::FinCalcResult;

/// Month counts within this distance of a whole number are treated as whole.
const PERIOD_SNAP: Decimal = dec!(0.000001);

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Longest loan or plan accepted, in years.
pub const MAX_TERM_YEARS: Decimal = dec!(100);

/// Row cap matching `MAX_TERM_YEARS`.
pub const MAX_SCHEDULE_MONTHS: u32 = 1200;

/// Unwrap a checked Decimal operation, reporting overflow as a domain error.
pub(crate) fn in_range(value: Option<Decimal>, context: &str) -> FinCalcResult<Decimal> {
    value.ok_or_else(|| FinCalcError::DomainError(format!("{context} overflows the decimal range")))
}

/// Monthly decimal rate from an annual percentage (6 -> 0.005).
pub fn monthly_rate(annual_pct: Percent) -> Rate {
    annual_pct / dec!(1200)
}

/// Number of monthly periods in a term given in years.
pub fn months(years: Decimal) -> Decimal {
    years * MONTHS_PER_YEAR
}

/// Compound growth factor (1 + r)^n.
///
/// Whole period counts use exact repeated multiplication; fractional counts
/// fall back to `powd`.
pub fn growth_factor(rate: Rate, periods: Decimal) -> FinCalcResult<Decimal> {
    let base = Decimal::ONE + rate;
    if base <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "rate".into(),
            reason: "Periodic rate must be greater than -100%".into(),
        });
    }

    let factor = if periods.fract().is_zero() {
        periods.to_i64().and_then(|n| base.checked_powi(n))
    } else {
        base.checked_powd(periods)
    };

    factor.ok_or_else(|| {
        FinCalcError::DomainError(format!(
            "growth factor (1 + {rate})^{periods} is out of range"
        ))
    })
}

/// Level payment that fully amortises `principal` over `periods` at `rate`.
///
/// `P * r * (1+r)^n / ((1+r)^n - 1)`, or `P / n` when the rate is zero.
pub fn annuity_payment(principal: Money, rate: Rate, periods: Decimal) -> FinCalcResult<Money> {
    if periods <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return in_range(principal.checked_div(periods), "annuity payment");
    }

    let factor = growth_factor(rate, periods)?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: "annuity payment factor".into(),
        });
    }

    in_range(
        principal
            .checked_mul(rate)
            .and_then(|v| v.checked_mul(factor))
            .and_then(|v| v.checked_div(denominator)),
        "annuity payment",
    )
}

/// Principal that a level `payment` amortises over `periods` at `rate`.
pub fn annuity_principal(payment: Money, rate: Rate, periods: Decimal) -> FinCalcResult<Money> {
    if periods <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return in_range(payment.checked_mul(periods), "annuity principal");
    }

    let factor = growth_factor(rate, periods)?;
    let denominator = in_range(rate.checked_mul(factor), "annuity principal factor")?;
    if denominator.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: "annuity principal factor".into(),
        });
    }

    in_range(
        payment
            .checked_mul(factor - Decimal::ONE)
            .and_then(|v| v.checked_div(denominator)),
        "annuity principal",
    )
}

/// Number of periods a level `payment` needs to amortise `principal`.
///
/// `n = -ln(1 - r*P/payment) / ln(1 + r)`. Fails with `DomainError` when the
/// payment never covers the interest (`r*P/payment >= 1`).
pub fn annuity_periods(principal: Money, rate: Rate, payment: Money) -> FinCalcResult<Decimal> {
    if payment <= Decimal::ZERO {
        return Err(FinCalcError::DomainError(
            "A non-positive payment can never amortise the principal".into(),
        ));
    }

    if rate.is_zero() {
        return in_range(principal.checked_div(payment), "annuity period count");
    }

    let interest = in_range(rate.checked_mul(principal), "periodic interest")?;
    let ratio = in_range(interest.checked_div(payment), "interest-to-payment ratio")?;
    if ratio >= Decimal::ONE {
        return Err(FinCalcError::DomainError(format!(
            "Payment {payment} does not exceed the periodic interest {} on the principal",
            interest.round_dp(2)
        )));
    }

    let numerator = (Decimal::ONE - ratio).checked_ln().ok_or_else(|| {
        FinCalcError::DomainError("ln(1 - r*P/payment) is undefined".into())
    })?;
    let denominator = (Decimal::ONE + rate).checked_ln().ok_or_else(|| {
        FinCalcError::DomainError("ln(1 + r) is undefined".into())
    })?;
    if denominator.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: "annuity period count".into(),
        });
    }

    in_range((-numerator).checked_div(denominator), "annuity period count")
}

/// Number of schedule rows for a possibly fractional month count.
///
/// Counts within `PERIOD_SNAP` of a whole number snap to it; otherwise the
/// final partial month gets its own row. At most `MAX_SCHEDULE_MONTHS` rows.
pub fn schedule_length(periods: Decimal) -> FinCalcResult<u32> {
    if periods <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if periods > Decimal::from(MAX_SCHEDULE_MONTHS) + PERIOD_SNAP {
        return Err(FinCalcError::InvalidInput {
            field: "periods".into(),
            reason: format!("{periods} periods exceeds the {MAX_SCHEDULE_MONTHS}-month limit"),
        });
    }

    let nearest = periods.round();
    let whole = if (periods - nearest).abs() <= PERIOD_SNAP {
        nearest
    } else {
        periods.ceil()
    };

    whole.to_u32().ok_or_else(|| FinCalcError::InvalidInput {
        field: "periods".into(),
        reason: format!("{periods} periods is too many to schedule"),
    })
}

/// Present Value
pub fn pv(rate: Rate, nper: u32, pmt: Money, fv: Money) -> FinCalcResult<Money> {
    if rate.is_zero() {
        return in_range(
            pmt.checked_mul(Decimal::from(nper)).and_then(|v| v.checked_add(fv)),
            "present value",
        )
        .map(|v| -v);
    }

    let factor = growth_factor(rate, Decimal::from(nper))?;

    if factor.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: "PV factor".into(),
        });
    }

    let discount = in_range(Decimal::ONE.checked_div(factor), "PV discount factor")?;
    let annuity_factor = in_range((Decimal::ONE - discount).checked_div(rate), "PV annuity factor")?;
    in_range(
        pmt.checked_mul(annuity_factor)
            .zip(fv.checked_mul(discount))
            .and_then(|(a, b)| a.checked_add(b)),
        "present value",
    )
    .map(|v| -v)
}

/// Future Value
pub fn fv(rate: Rate, nper: u32, pmt: Money, present_value: Money) -> FinCalcResult<Money> {
    if rate.is_zero() {
        return in_range(
            pmt.checked_mul(Decimal::from(nper))
                .and_then(|v| v.checked_add(present_value)),
            "future value",
        )
        .map(|v| -v);
    }

    let factor = growth_factor(rate, Decimal::from(nper))?;
    let annuity_factor = in_range((factor - Decimal::ONE).checked_div(rate), "FV annuity factor")?;

    in_range(
        present_value
            .checked_mul(factor)
            .zip(pmt.checked_mul(annuity_factor))
            .and_then(|(a, b)| a.checked_add(b)),
        "future value",
    )
    .map(|v| -v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_rate_from_percent() {
        assert_eq!(monthly_rate(dec!(6)), dec!(0.005));
        assert_eq!(monthly_rate(dec!(0)), Decimal::ZERO);
    }

    #[test]
    fn test_annuity_payment_standard_loan() {
        // 24k over 24 months at 0.5%/month
        let result = annuity_payment(dec!(24000), dec!(0.005), dec!(24)).unwrap();
        assert!((result - dec!(1063.69)).abs() < dec!(0.01));
    }

    #[test]
    fn test_annuity_payment_zero_rate_is_straight_line() {
        let result = annuity_payment(dec!(24000), Decimal::ZERO, dec!(24)).unwrap();
        assert_eq!(result, dec!(1000));
    }

    #[test]
    fn test_annuity_principal_inverts_payment() {
        let payment = annuity_payment(dec!(150000), dec!(0.004), dec!(360)).unwrap();
        let principal = annuity_principal(payment, dec!(0.004), dec!(360)).unwrap();
        assert!((principal - dec!(150000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_annuity_periods_inverts_payment() {
        let payment = annuity_payment(dec!(24000), dec!(0.005), dec!(24)).unwrap();
        let n = annuity_periods(dec!(24000), dec!(0.005), payment).unwrap();
        assert!((n - dec!(24)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_annuity_periods_domain_error() {
        // Interest alone is 120/month
        let result = annuity_periods(dec!(24000), dec!(0.005), dec!(120));
        assert!(matches!(result, Err(FinCalcError::DomainError(_))));
    }

    #[test]
    fn test_schedule_length_snaps_and_rounds_up() {
        assert_eq!(schedule_length(dec!(24)).unwrap(), 24);
        assert_eq!(schedule_length(dec!(23.9999999)).unwrap(), 24);
        assert_eq!(schedule_length(dec!(27.6)).unwrap(), 28);
        assert!(schedule_length(Decimal::ZERO).is_err());
    }

    #[test]
    fn test_schedule_length_caps_rows() {
        assert_eq!(schedule_length(dec!(1200)).unwrap(), MAX_SCHEDULE_MONTHS);
        assert!(matches!(
            schedule_length(dec!(1200000000)),
            Err(FinCalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_annuity_payment_overflow_is_domain_error() {
        let huge = dec!(50000000000000000000000000000);
        let result = annuity_payment(huge, dec!(0.005), dec!(1200));
        assert!(matches!(result, Err(FinCalcError::DomainError(_))));

        let result = annuity_principal(huge, dec!(0.005), dec!(1200));
        assert!(matches!(result, Err(FinCalcError::DomainError(_))));
    }

    #[test]
    fn test_growth_factor_fractional_periods() {
        let whole = growth_factor(dec!(0.01), dec!(12)).unwrap();
        let frac = growth_factor(dec!(0.01), dec!(12.5)).unwrap();
        assert!(frac > whole);
        assert!(frac < whole * dec!(1.01));
    }

    #[test]
    fn test_pv_basic() {
        let result = pv(dec!(0.08), 10, dec!(-100), dec!(0)).unwrap();
        // PV of annuity: 100 * (1 - 1/1.08^10) / 0.08 = ~671
        assert!((result - dec!(671)).abs() < dec!(2.0));
    }

    #[test]
    fn test_fv_zero_rate() {
        let result = fv(Decimal::ZERO, 12, dec!(-100), dec!(-1000)).unwrap();
        assert_eq!(result, dec!(2200));
    }
}
