use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::investments::{require_non_negative, whole_months};
use crate::time_value::{fv, in_range};
use crate::types::{with_metadata, ComputationOutput, DurationUnit, Money, Percent};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a systematic investment plan projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipInput {
    /// Lump sum invested at month 0.
    #[serde(default)]
    pub initial_investment: Money,
    /// Contribution made at the end of every month.
    pub monthly_contribution: Money,
    pub duration: Decimal,
    #[serde(default)]
    pub duration_unit: DurationUnit,
    /// Expected annual return in percent, compounded monthly.
    pub expected_annual_return: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipOutput {
    pub total_months: u32,
    pub future_value: Money,
    pub total_invested: Money,
    pub estimated_gains: Money,
    /// Month 0 through `total_months`.
    pub growth: Vec<SipPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipPoint {
    pub month: u32,
    pub invested: Money,
    pub value: Money,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Project the value of a lump sum plus level monthly contributions.
///
/// FV = lump·(1+r)^N + Σ_{m=1..N} c·(1+r)^(N−m), with r the monthly rate.
pub fn project_sip(input: &SipInput) -> FinCalcResult<ComputationOutput<SipOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_non_negative("initial_investment", input.initial_investment)?;
    require_non_negative("monthly_contribution", input.monthly_contribution)?;
    require_non_negative("expected_annual_return", input.expected_annual_return)?;
    let total_months = whole_months(input.duration, input.duration_unit)?;

    if total_months == 0 {
        warnings.push("Zero-length plan: value equals the initial investment".into());
    }

    let rate = input.expected_annual_return / dec!(100) / dec!(12);

    // Closed form via the Excel-convention FV (outflows negative).
    let future_value = fv(
        rate,
        total_months,
        -input.monthly_contribution,
        -input.initial_investment,
    )?;

    let mut growth = Vec::with_capacity(total_months as usize + 1);
    let mut value = input.initial_investment;
    let mut invested = input.initial_investment;
    growth.push(SipPoint {
        month: 0,
        invested,
        value,
    });
    for month in 1..=total_months {
        value = in_range(
            value
                .checked_mul(Decimal::ONE + rate)
                .and_then(|v| v.checked_add(input.monthly_contribution)),
            "SIP value",
        )?;
        invested = in_range(
            invested.checked_add(input.monthly_contribution),
            "SIP amount invested",
        )?;
        growth.push(SipPoint {
            month,
            invested,
            value,
        });
    }

    let total_invested = invested;

    let output = SipOutput {
        total_months,
        future_value,
        total_invested,
        estimated_gains: future_value - total_invested,
        growth,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SIP future value: compounded lump sum plus end-of-month contributions",
        input,
        warnings,
        elapsed,
        output,
    ))
}
