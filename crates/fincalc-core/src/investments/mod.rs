pub mod sip;
pub mod swp;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::FinCalcError;
use crate::time_value::{MAX_SCHEDULE_MONTHS, MAX_TERM_YEARS};
use crate::types::DurationUnit;
use crate::FinCalcResult;

/// Resolve a calculator duration to a whole number of months.
pub(crate) fn whole_months(duration: Decimal, unit: DurationUnit) -> FinCalcResult<u32> {
    if duration < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "duration".into(),
            reason: "duration must be >= 0".into(),
        });
    }

    let limit = match unit {
        DurationUnit::Years => MAX_TERM_YEARS,
        DurationUnit::Months => Decimal::from(MAX_SCHEDULE_MONTHS),
    };
    if duration > limit {
        return Err(FinCalcError::InvalidInput {
            field: "duration".into(),
            reason: format!("duration must be <= {MAX_TERM_YEARS} years"),
        });
    }

    let months = unit.to_months(duration);
    if !months.fract().is_zero() {
        return Err(FinCalcError::InvalidInput {
            field: "duration".into(),
            reason: format!("duration must resolve to a whole number of months (got {months})"),
        });
    }

    months.to_u32().ok_or_else(|| FinCalcError::InvalidInput {
        field: "duration".into(),
        reason: format!("{months} months is out of range"),
    })
}

pub(crate) fn require_non_negative(field: &str, value: Decimal) -> FinCalcResult<()> {
    if value < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: field.into(),
            reason: format!("{field} must be >= 0"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_whole_months_from_years() {
        assert_eq!(whole_months(dec!(10), DurationUnit::Years).unwrap(), 120);
        assert_eq!(whole_months(dec!(2.5), DurationUnit::Years).unwrap(), 30);
        assert_eq!(whole_months(dec!(7), DurationUnit::Months).unwrap(), 7);
    }

    #[test]
    fn test_whole_months_rejects_partial_month() {
        assert!(whole_months(dec!(1.3), DurationUnit::Years).is_err());
        assert!(whole_months(dec!(-1), DurationUnit::Months).is_err());
    }

    #[test]
    fn test_whole_months_caps_duration() {
        assert_eq!(whole_months(dec!(100), DurationUnit::Years).unwrap(), 1200);
        assert!(matches!(
            whole_months(dec!(101), DurationUnit::Years),
            Err(FinCalcError::InvalidInput { .. })
        ));
        assert!(matches!(
            whole_months(dec!(100000000), DurationUnit::Months),
            Err(FinCalcError::InvalidInput { .. })
        ));
    }
}
