use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::investments::{require_non_negative, whole_months};
use crate::time_value::{growth_factor, in_range, pv};
use crate::types::{with_metadata, ComputationOutput, DurationUnit, Money, Percent};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a level systematic withdrawal plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwpInput {
    pub initial_investment: Money,
    pub monthly_withdrawal: Money,
    pub duration: Decimal,
    #[serde(default)]
    pub duration_unit: DurationUnit,
    /// Expected annual return in percent, compounded monthly.
    pub expected_annual_return: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwpOutput {
    pub total_months: u32,
    /// May be negative when withdrawals outrun the corpus.
    pub remaining_value: Money,
    pub total_withdrawn: Money,
    pub depleted: bool,
    /// Month 0 through `total_months`.
    pub balances: Vec<SwpPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwpPoint {
    pub month: u32,
    pub value: Money,
}

/// Input for a withdrawal plan whose withdrawal rises with inflation each year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwpInflationInput {
    pub initial_investment: Money,
    /// Monthly withdrawal in the first year.
    pub monthly_withdrawal: Money,
    pub duration: Decimal,
    #[serde(default)]
    pub duration_unit: DurationUnit,
    pub expected_annual_return: Percent,
    /// Annual inflation in percent; withdrawals step up once per year.
    pub inflation_rate: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwpInflationOutput {
    pub total_months: u32,
    pub final_balance: Money,
    pub total_withdrawn: Money,
    /// First month in which the corpus was fully drawn down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depletion_month: Option<u32>,
    pub yearly: Vec<SwpYear>,
}

/// One row per plan year (the last row may cover a partial year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwpYear {
    pub year: u32,
    /// Inflation-adjusted annual withdrawal scheduled for the year.
    pub scheduled_withdrawal: Money,
    /// What was actually withdrawn, capped by the balance.
    pub actual_withdrawal: Money,
    pub remaining_balance: Money,
}

// ---------------------------------------------------------------------------
// Level SWP
// ---------------------------------------------------------------------------

/// Remaining value of a corpus after level monthly withdrawals.
///
/// Value(N) = corpus·(1+r)^N − Σ_{m=1..N} w·(1+r)^(−m): the corpus is grown
/// to month N while the withdrawals are discounted back to month 0.
pub fn project_swp(input: &SwpInput) -> FinCalcResult<ComputationOutput<SwpOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_non_negative("initial_investment", input.initial_investment)?;
    require_non_negative("monthly_withdrawal", input.monthly_withdrawal)?;
    require_non_negative("expected_annual_return", input.expected_annual_return)?;
    let total_months = whole_months(input.duration, input.duration_unit)?;

    let rate = input.expected_annual_return / dec!(100) / dec!(12);

    let mut balances = Vec::with_capacity(total_months as usize + 1);
    for month in 0..=total_months {
        balances.push(SwpPoint {
            month,
            value: swp_value(input.initial_investment, input.monthly_withdrawal, rate, month)?,
        });
    }

    let remaining_value = balances
        .last()
        .map(|p| p.value)
        .unwrap_or(input.initial_investment);
    let depleted = remaining_value < Decimal::ZERO;
    if depleted {
        debug!(remaining = %remaining_value, "SWP corpus exhausted");
        warnings.push(format!(
            "Withdrawals exceed the corpus: remaining value is {}",
            remaining_value.round_dp(2)
        ));
    }

    let output = SwpOutput {
        total_months,
        remaining_value,
        total_withdrawn: in_range(
            input.monthly_withdrawal.checked_mul(Decimal::from(total_months)),
            "total withdrawn",
        )?,
        depleted,
        balances,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SWP remaining value: compounded corpus less present value of withdrawals",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn swp_value(corpus: Money, withdrawal: Money, rate: Decimal, months: u32) -> FinCalcResult<Money> {
    let grown = in_range(
        corpus.checked_mul(growth_factor(rate, Decimal::from(months))?),
        "SWP corpus growth",
    )?;
    // pv() follows the Excel sign convention, so a positive payment yields a
    // negative present value.
    Ok(grown + pv(rate, months, withdrawal, Decimal::ZERO)?)
}

// ---------------------------------------------------------------------------
// Inflation-adjusted SWP
// ---------------------------------------------------------------------------

/// Month-by-month drawdown with the withdrawal stepped up by inflation at the
/// start of each plan year. Each month the withdrawal (capped at the balance)
/// comes out first, then the month's return is credited.
pub fn project_swp_with_inflation(
    input: &SwpInflationInput,
) -> FinCalcResult<ComputationOutput<SwpInflationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_non_negative("initial_investment", input.initial_investment)?;
    require_non_negative("monthly_withdrawal", input.monthly_withdrawal)?;
    require_non_negative("expected_annual_return", input.expected_annual_return)?;
    require_non_negative("inflation_rate", input.inflation_rate)?;
    let total_months = whole_months(input.duration, input.duration_unit)?;

    let monthly_return = input.expected_annual_return / dec!(100) / dec!(12);
    let inflation = input.inflation_rate / dec!(100);
    let base_annual_withdrawal = in_range(
        input.monthly_withdrawal.checked_mul(dec!(12)),
        "annual withdrawal",
    )?;

    let mut yearly: Vec<SwpYear> = Vec::new();
    let mut balance = input.initial_investment;
    let mut total_withdrawn = Decimal::ZERO;
    let mut withdrawn_this_year = Decimal::ZERO;
    let mut depletion_month: Option<u32> = None;

    for month in 1..=total_months {
        let year_index = (month - 1) / 12;
        let scheduled_annual = in_range(
            base_annual_withdrawal
                .checked_mul(growth_factor(inflation, Decimal::from(year_index))?),
            "inflation-adjusted withdrawal",
        )?;

        if balance > Decimal::ZERO {
            let withdrawal = (scheduled_annual / dec!(12)).min(balance);
            balance -= withdrawal;
            withdrawn_this_year += withdrawal;
            total_withdrawn = in_range(total_withdrawn.checked_add(withdrawal), "total withdrawn")?;
            if balance.is_zero() && depletion_month.is_none() {
                depletion_month = Some(month);
            }
        }

        balance = in_range(balance.checked_mul(Decimal::ONE + monthly_return), "SWP balance")?;

        if month % 12 == 0 || month == total_months {
            yearly.push(SwpYear {
                year: year_index + 1,
                scheduled_withdrawal: scheduled_annual,
                actual_withdrawal: withdrawn_this_year,
                remaining_balance: balance.max(Decimal::ZERO),
            });
            withdrawn_this_year = Decimal::ZERO;
        }
    }

    if let Some(month) = depletion_month {
        warnings.push(format!("Corpus fully drawn down in month {month}"));
    }

    let output = SwpInflationOutput {
        total_months,
        final_balance: balance.max(Decimal::ZERO),
        total_withdrawn,
        depletion_month,
        yearly,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Inflation-adjusted SWP: withdraw-then-compound monthly, withdrawal indexed yearly",
        input,
        warnings,
        elapsed,
        output,
    ))
}
