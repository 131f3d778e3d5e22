use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::FinCalcError;
use crate::time_value::{
    annuity_payment, annuity_periods, annuity_principal, in_range, monthly_rate, months,
    MAX_TERM_YEARS,
};
use crate::types::{Money, Percent, Years};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A loan with at most one unknown field. `None` marks the unknown; zero is a
/// legitimate value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    /// Principal before the down payment is subtracted.
    pub loan_amount: Option<Money>,
    /// Annual interest rate in percent (6 = 6%).
    pub interest_rate: Option<Percent>,
    pub loan_term_years: Option<Years>,
    #[serde(default)]
    pub down_payment: Money,
    pub monthly_payment: Option<Money>,
}

impl LoanRecord {
    /// Principal actually amortised, if the loan amount is known.
    pub fn financed_principal(&self) -> Option<Money> {
        self.loan_amount.map(|amount| amount - self.down_payment)
    }

    fn unknown_fields(&self) -> Vec<LoanField> {
        let mut unknown = Vec::new();
        if self.loan_amount.is_none() {
            unknown.push(LoanField::LoanAmount);
        }
        if self.interest_rate.is_none() {
            unknown.push(LoanField::InterestRate);
        }
        if self.loan_term_years.is_none() {
            unknown.push(LoanField::LoanTerm);
        }
        if self.monthly_payment.is_none() {
            unknown.push(LoanField::MonthlyPayment);
        }
        unknown
    }
}

/// The field a solve filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanField {
    LoanAmount,
    InterestRate,
    #[serde(rename = "loan_term_years")]
    LoanTerm,
    MonthlyPayment,
}

/// Bracket and tolerances for the interest-rate bisection.
///
/// The default ceiling of 20% p.a. is a business rule: rates above it are
/// reported as the ceiling rather than searched for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateSearchConfig {
    /// Lowest annual rate considered, in percent.
    pub lower_bound: Percent,
    /// Highest annual rate considered, in percent.
    pub upper_bound: Percent,
    /// Absolute tolerance on both the bracket width and the payment residual.
    pub tolerance: Decimal,
    pub max_iterations: u32,
}

impl Default for RateSearchConfig {
    fn default() -> Self {
        Self {
            lower_bound: Decimal::ZERO,
            upper_bound: dec!(20),
            tolerance: dec!(0.0001),
            max_iterations: 64,
        }
    }
}

/// How the interest-rate search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSearchStatus {
    Converged,
    /// Even the ceiling rate's payment is below the target; the ceiling is returned.
    ClampedAtCeiling,
    /// Even the floor rate's payment exceeds the target; the floor is returned.
    ClampedAtFloor,
    /// Iteration cap hit before the tolerance; the last midpoint is returned.
    MaxIterations,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSearchReport {
    pub status: RateSearchStatus,
    pub iterations: u32,
    /// Candidate payment minus target payment at the returned rate.
    pub residual: Money,
}

impl RateSearchReport {
    /// Human-readable note for clamped or truncated searches.
    pub fn warning(&self, config: &RateSearchConfig) -> Option<String> {
        match self.status {
            RateSearchStatus::Converged => None,
            RateSearchStatus::ClampedAtCeiling => Some(format!(
                "Rate search exhausted: payment implies a rate above {}%; reporting the ceiling",
                config.upper_bound
            )),
            RateSearchStatus::ClampedAtFloor => Some(format!(
                "Rate search exhausted: payment implies a rate below {}%; reporting the floor",
                config.lower_bound
            )),
            RateSearchStatus::MaxIterations => Some(format!(
                "Rate search stopped after {} iterations (residual {})",
                self.iterations,
                self.residual.round_dp(6)
            )),
        }
    }
}

/// A resolved loan record plus how it was resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSolution {
    pub record: LoanRecord,
    pub solved_for: LoanField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_search: Option<RateSearchReport>,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Fill in the single unknown field of `record` using the default rate search.
pub fn solve(record: &LoanRecord) -> FinCalcResult<LoanRecord> {
    solve_with(record, &RateSearchConfig::default()).map(|solution| solution.record)
}

/// Fill in the single unknown field of `record`.
///
/// Exactly one of loan amount, rate, term and payment must be unknown;
/// anything else is `InsufficientData`.
pub fn solve_with(record: &LoanRecord, config: &RateSearchConfig) -> FinCalcResult<LoanSolution> {
    validate_record(record)?;

    let unknown = record.unknown_fields();
    if unknown.len() != 1 {
        return Err(FinCalcError::InsufficientData(format!(
            "exactly one of loan_amount, interest_rate, loan_term_years, monthly_payment \
             must be unknown ({} unknown)",
            unknown.len()
        )));
    }

    let down = record.down_payment;
    let mut resolved = record.clone();

    match (
        record.loan_amount,
        record.interest_rate,
        record.loan_term_years,
        record.monthly_payment,
    ) {
        (Some(amount), Some(rate), Some(term), None) => {
            debug!(solve_for = "monthly_payment", "dispatching loan solve");
            resolved.monthly_payment = Some(solve_payment(amount, rate, term, down)?);
            Ok(LoanSolution {
                record: resolved,
                solved_for: LoanField::MonthlyPayment,
                rate_search: None,
            })
        }
        (None, Some(rate), Some(term), Some(payment)) => {
            debug!(solve_for = "loan_amount", "dispatching loan solve");
            resolved.loan_amount = Some(solve_principal(payment, rate, term, down)?);
            Ok(LoanSolution {
                record: resolved,
                solved_for: LoanField::LoanAmount,
                rate_search: None,
            })
        }
        (Some(amount), Some(rate), None, Some(payment)) => {
            debug!(solve_for = "loan_term_years", "dispatching loan solve");
            resolved.loan_term_years = Some(solve_term(amount, payment, rate, down)?);
            Ok(LoanSolution {
                record: resolved,
                solved_for: LoanField::LoanTerm,
                rate_search: None,
            })
        }
        (Some(amount), None, Some(term), Some(payment)) => {
            debug!(solve_for = "interest_rate", "dispatching loan solve");
            let (rate, report) = solve_rate(amount, term, down, payment, config)?;
            resolved.interest_rate = Some(rate);
            Ok(LoanSolution {
                record: resolved,
                solved_for: LoanField::InterestRate,
                rate_search: Some(report),
            })
        }
        _ => Err(FinCalcError::InsufficientData(
            "Insufficient data provided".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Individual solves
// ---------------------------------------------------------------------------

/// Monthly payment for a fully specified loan.
pub fn solve_payment(
    loan_amount: Money,
    annual_rate_pct: Percent,
    term_years: Years,
    down_payment: Money,
) -> FinCalcResult<Money> {
    let principal = loan_amount - down_payment;
    annuity_payment(principal, monthly_rate(annual_rate_pct), months(term_years))
}

/// Loan amount (including the down payment) that `monthly_payment` supports.
pub fn solve_principal(
    monthly_payment: Money,
    annual_rate_pct: Percent,
    term_years: Years,
    down_payment: Money,
) -> FinCalcResult<Money> {
    let principal = annuity_principal(
        monthly_payment,
        monthly_rate(annual_rate_pct),
        months(term_years),
    )?;
    in_range(principal.checked_add(down_payment), "loan amount")
}

/// Term in years needed for `monthly_payment` to amortise the loan.
pub fn solve_term(
    loan_amount: Money,
    monthly_payment: Money,
    annual_rate_pct: Percent,
    down_payment: Money,
) -> FinCalcResult<Years> {
    let principal = loan_amount - down_payment;
    if principal <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "loan_amount".into(),
            reason: "Principal after down payment must be > 0 to solve for the term".into(),
        });
    }

    let periods = annuity_periods(principal, monthly_rate(annual_rate_pct), monthly_payment)?;
    Ok(periods / dec!(12))
}

/// Annual rate (percent) at which `monthly_payment` amortises the loan, by
/// bisection over `config`'s bracket.
///
/// Targets outside the bracket's payment range are clamped to the nearer
/// bound and flagged in the report rather than treated as errors.
pub fn solve_rate(
    loan_amount: Money,
    term_years: Years,
    down_payment: Money,
    monthly_payment: Money,
    config: &RateSearchConfig,
) -> FinCalcResult<(Percent, RateSearchReport)> {
    validate_config(config)?;

    let principal = loan_amount - down_payment;
    if principal <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "loan_amount".into(),
            reason: "Principal after down payment must be > 0 to solve for the rate".into(),
        });
    }

    let periods = months(term_years);
    let tolerance = config.tolerance;
    let payment_at =
        |annual_pct: Percent| annuity_payment(principal, monthly_rate(annual_pct), periods);

    let ceiling_residual = payment_at(config.upper_bound)? - monthly_payment;
    if ceiling_residual < -tolerance {
        warn!(
            target_payment = %monthly_payment,
            ceiling = %config.upper_bound,
            "rate search clamped at ceiling"
        );
        return Ok((
            config.upper_bound,
            RateSearchReport {
                status: RateSearchStatus::ClampedAtCeiling,
                iterations: 0,
                residual: ceiling_residual,
            },
        ));
    }

    let floor_residual = payment_at(config.lower_bound)? - monthly_payment;
    if floor_residual > tolerance {
        warn!(
            target_payment = %monthly_payment,
            floor = %config.lower_bound,
            "rate search clamped at floor"
        );
        return Ok((
            config.lower_bound,
            RateSearchReport {
                status: RateSearchStatus::ClampedAtFloor,
                iterations: 0,
                residual: floor_residual,
            },
        ));
    }

    let mut low = config.lower_bound;
    let mut high = config.upper_bound;
    let mut mid = midpoint(low, high);
    let mut residual = Decimal::ZERO;

    for iteration in 1..=config.max_iterations {
        mid = midpoint(low, high);
        let candidate = payment_at(mid)?;
        residual = candidate - monthly_payment;
        trace!(iteration, rate = %mid, residual = %residual, "rate bisection step");

        if residual.abs() < tolerance {
            return Ok((mid, converged(iteration, residual)));
        }

        // A candidate below target means the true rate is higher.
        if candidate < monthly_payment {
            low = mid;
        } else {
            high = mid;
        }

        if high - low < tolerance {
            mid = midpoint(low, high);
            let residual = payment_at(mid)? - monthly_payment;
            return Ok((mid, converged(iteration, residual)));
        }
    }

    warn!(
        iterations = config.max_iterations,
        residual = %residual,
        "rate search hit the iteration cap"
    );
    Ok((
        mid,
        RateSearchReport {
            status: RateSearchStatus::MaxIterations,
            iterations: config.max_iterations,
            residual,
        },
    ))
}

fn midpoint(low: Percent, high: Percent) -> Percent {
    low + (high - low) / dec!(2)
}

fn converged(iterations: u32, residual: Money) -> RateSearchReport {
    RateSearchReport {
        status: RateSearchStatus::Converged,
        iterations,
        residual,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_record(record: &LoanRecord) -> FinCalcResult<()> {
    let non_negative = [
        ("loan_amount", record.loan_amount),
        ("interest_rate", record.interest_rate),
        ("monthly_payment", record.monthly_payment),
        ("down_payment", Some(record.down_payment)),
    ];
    for (field, value) in non_negative {
        if let Some(v) = value {
            if v < Decimal::ZERO {
                return Err(FinCalcError::InvalidInput {
                    field: field.into(),
                    reason: format!("{field} must be >= 0"),
                });
            }
        }
    }

    if let Some(term) = record.loan_term_years {
        if term <= Decimal::ZERO {
            return Err(FinCalcError::InvalidInput {
                field: "loan_term_years".into(),
                reason: "loan_term_years must be > 0".into(),
            });
        }
        if term > MAX_TERM_YEARS {
            return Err(FinCalcError::InvalidInput {
                field: "loan_term_years".into(),
                reason: format!("loan_term_years must be <= {MAX_TERM_YEARS}"),
            });
        }
    }

    if let Some(amount) = record.loan_amount {
        if record.down_payment > amount {
            return Err(FinCalcError::InvalidInput {
                field: "down_payment".into(),
                reason: "down_payment must not exceed loan_amount".into(),
            });
        }
    }

    Ok(())
}

fn validate_config(config: &RateSearchConfig) -> FinCalcResult<()> {
    if config.lower_bound < Decimal::ZERO || config.upper_bound <= config.lower_bound {
        return Err(FinCalcError::InvalidInput {
            field: "rate_search".into(),
            reason: "bracket must satisfy 0 <= lower_bound < upper_bound".into(),
        });
    }
    if config.tolerance <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "rate_search.tolerance".into(),
            reason: "tolerance must be > 0".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(
        amount: Option<Decimal>,
        rate: Option<Decimal>,
        term: Option<Decimal>,
        payment: Option<Decimal>,
    ) -> LoanRecord {
        LoanRecord {
            loan_amount: amount,
            interest_rate: rate,
            loan_term_years: term,
            down_payment: Decimal::ZERO,
            monthly_payment: payment,
        }
    }

    fn rel_err(actual: Decimal, expected: Decimal) -> Decimal {
        ((actual - expected) / expected).abs()
    }

    #[test]
    fn test_solve_payment_standard_loan() {
        let input = record(Some(dec!(24000)), Some(dec!(6)), Some(dec!(2)), None);
        let solved = solve(&input).unwrap();
        let payment = solved.monthly_payment.unwrap();
        assert!((payment - dec!(1063.69)).abs() < dec!(0.01), "got {payment}");
        // Known fields untouched
        assert_eq!(solved.loan_amount, Some(dec!(24000)));
        assert_eq!(solved.interest_rate, Some(dec!(6)));
    }

    #[test]
    fn test_solve_payment_zero_rate() {
        let input = record(Some(dec!(24000)), Some(dec!(0)), Some(dec!(2)), None);
        let solved = solve(&input).unwrap();
        assert_eq!(solved.monthly_payment, Some(dec!(1000)));
    }

    #[test]
    fn test_solve_payment_subtracts_down_payment() {
        let mut input = record(Some(dec!(30000)), Some(dec!(0)), Some(dec!(2)), None);
        input.down_payment = dec!(6000);
        let solved = solve(&input).unwrap();
        assert_eq!(solved.monthly_payment, Some(dec!(1000)));
    }

    #[test]
    fn test_solve_principal_adds_down_payment_back() {
        let payment = solve_payment(dec!(30000), dec!(7.5), dec!(5), dec!(5000)).unwrap();
        let mut input = record(None, Some(dec!(7.5)), Some(dec!(5)), Some(payment));
        input.down_payment = dec!(5000);
        let solved = solve(&input).unwrap();
        let amount = solved.loan_amount.unwrap();
        assert!(rel_err(amount, dec!(30000)) < dec!(0.000001), "got {amount}");
    }

    #[test]
    fn test_solve_term_round_trip() {
        let payment = solve_payment(dec!(24000), dec!(6), dec!(2), Decimal::ZERO).unwrap();
        let input = record(Some(dec!(24000)), Some(dec!(6)), None, Some(payment));
        let solved = solve(&input).unwrap();
        let term = solved.loan_term_years.unwrap();
        assert!(rel_err(term, dec!(2)) < dec!(0.000001), "got {term}");
    }

    #[test]
    fn test_solve_term_zero_rate() {
        let input = record(Some(dec!(12000)), Some(dec!(0)), None, Some(dec!(500)));
        let solved = solve(&input).unwrap();
        assert_eq!(solved.loan_term_years, Some(dec!(2)));
    }

    #[test]
    fn test_solve_term_payment_below_interest_is_domain_error() {
        // Monthly interest on 24k at 6% is exactly 120
        let input = record(Some(dec!(24000)), Some(dec!(6)), None, Some(dec!(120)));
        let result = solve(&input);
        assert!(matches!(result, Err(FinCalcError::DomainError(_))));

        let input = record(Some(dec!(24000)), Some(dec!(6)), None, Some(dec!(50)));
        assert!(matches!(solve(&input), Err(FinCalcError::DomainError(_))));
    }

    #[test]
    fn test_solve_rate_recovers_six_percent() {
        let payment = solve_payment(dec!(24000), dec!(6), dec!(2), Decimal::ZERO).unwrap();
        let input = record(Some(dec!(24000)), None, Some(dec!(2)), Some(payment));
        let solution = solve_with(&input, &RateSearchConfig::default()).unwrap();
        let rate = solution.record.interest_rate.unwrap();
        assert!((rate - dec!(6)).abs() < dec!(0.01), "got {rate}");
        assert_eq!(solution.solved_for, LoanField::InterestRate);
        let report = solution.rate_search.unwrap();
        assert_eq!(report.status, RateSearchStatus::Converged);
        assert!(report.iterations <= 25);
    }

    #[test]
    fn test_solve_rate_within_bisection_tolerance() {
        let payment = solve_payment(dec!(150000), dec!(11.25), dec!(15), dec!(20000)).unwrap();
        let mut input = record(Some(dec!(150000)), None, Some(dec!(15)), Some(payment));
        input.down_payment = dec!(20000);
        let rate = solve(&input).unwrap().interest_rate.unwrap();
        assert!((rate - dec!(11.25)).abs() < dec!(0.0001), "got {rate}");
    }

    #[test]
    fn test_solve_rate_clamps_at_ceiling() {
        // A 20% loan of 24k over 2 years pays ~1223; 2000 needs a far higher rate
        let input = record(Some(dec!(24000)), None, Some(dec!(2)), Some(dec!(2000)));
        let solution = solve_with(&input, &RateSearchConfig::default()).unwrap();
        assert_eq!(solution.record.interest_rate, Some(dec!(20)));
        let report = solution.rate_search.unwrap();
        assert_eq!(report.status, RateSearchStatus::ClampedAtCeiling);
        assert!(report.warning(&RateSearchConfig::default()).is_some());
    }

    #[test]
    fn test_solve_rate_clamps_at_floor() {
        // Straight-line repayment is 1000/month; 900 implies a negative rate
        let input = record(Some(dec!(24000)), None, Some(dec!(2)), Some(dec!(900)));
        let solution = solve_with(&input, &RateSearchConfig::default()).unwrap();
        assert_eq!(solution.record.interest_rate, Some(Decimal::ZERO));
        assert_eq!(
            solution.rate_search.unwrap().status,
            RateSearchStatus::ClampedAtFloor
        );
    }

    #[test]
    fn test_no_unknown_field_is_insufficient_data() {
        let input = record(Some(dec!(24000)), Some(dec!(6)), Some(dec!(2)), Some(dec!(1063.69)));
        assert!(matches!(
            solve(&input),
            Err(FinCalcError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_two_unknown_fields_is_insufficient_data() {
        let input = record(Some(dec!(24000)), None, Some(dec!(2)), None);
        assert!(matches!(
            solve(&input),
            Err(FinCalcError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_zero_amount_is_not_unknown() {
        let input = record(Some(dec!(0)), Some(dec!(6)), Some(dec!(2)), None);
        let solved = solve(&input).unwrap();
        assert_eq!(solved.monthly_payment, Some(Decimal::ZERO));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let input = record(Some(dec!(-1)), Some(dec!(6)), Some(dec!(2)), None);
        assert!(matches!(
            solve(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));

        let input = record(Some(dec!(1000)), Some(dec!(6)), Some(dec!(0)), None);
        assert!(matches!(
            solve(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));

        let mut input = record(Some(dec!(1000)), Some(dec!(6)), Some(dec!(2)), None);
        input.down_payment = dec!(2000);
        assert!(matches!(
            solve(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_huge_loan_is_an_error_not_a_panic() {
        let huge = Some(dec!(50000000000000000000000000000));
        let input = record(huge, Some(dec!(6)), Some(dec!(100)), None);
        assert!(matches!(solve(&input), Err(FinCalcError::DomainError(_))));

        let input = record(huge, None, Some(dec!(100)), Some(dec!(1000)));
        assert!(solve(&input).is_err());
    }

    #[test]
    fn test_term_beyond_limit_rejected() {
        let input = record(Some(dec!(1000)), Some(dec!(5)), Some(dec!(100000000)), None);
        assert!(matches!(
            solve(&input),
            Err(FinCalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_record_deserializes_missing_as_unknown() {
        let input: LoanRecord = serde_json::from_str(
            r#"{"loan_amount": "24000", "interest_rate": "6", "loan_term_years": "2"}"#,
        )
        .unwrap();
        assert_eq!(input.monthly_payment, None);
        assert_eq!(input.down_payment, Decimal::ZERO);
    }
}
