use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::error::FinCalcError;
use crate::time_value::{in_range, months, schedule_length, MAX_TERM_YEARS};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::FinCalcResult;

/// Residual balance above which a finished schedule is flagged.
pub const RESIDUAL_BALANCE_TOLERANCE: Money = dec!(0.5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// 1-based month index.
    pub month: u32,
    /// Amount charged this month; once the loan is paid off this shrinks to
    /// what remains owed.
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Balance after this month's payment, never negative.
    pub remaining_balance: Money,
}

/// Input for a standalone schedule: a fully resolved loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    /// Principal after any down payment.
    pub principal: Money,
    pub annual_rate_pct: Percent,
    pub term_years: Years,
    pub monthly_payment: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub schedule: Vec<AmortizationEntry>,
    pub summary: ScheduleSummary,
}

/// Totals over a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub number_of_payments: u32,
    pub total_payment: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub final_balance: Money,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Expand a resolved loan into a month-by-month schedule.
///
/// A strict left fold: each month's interest accrues on the previous
/// (clamped) balance and the payment is not adjusted in the final month, so
/// an independently supplied payment may leave a residual balance. A month
/// never retires more principal than is outstanding, so the recorded payment
/// drops to the payoff amount and then to zero.
pub fn generate_schedule(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: Years,
    monthly_payment: Money,
) -> FinCalcResult<Vec<AmortizationEntry>> {
    validate(principal, annual_rate_pct, term_years, monthly_payment)?;

    let monthly_rate = annual_rate_pct / dec!(100) / dec!(12);
    let total_months = schedule_length(months(term_years))?;

    let mut schedule = Vec::with_capacity(total_months as usize);
    let mut balance = principal;

    for month in 1..=total_months {
        let interest = in_range(balance.checked_mul(monthly_rate), "monthly interest")?;
        let owed = in_range(balance.checked_add(interest), "amount owed")?;
        let payment = monthly_payment.min(owed);
        // Negative amortisation is not modelled: a payment short of the
        // interest repays nothing and leaves the balance where it was.
        let principal_paid = (payment - interest).max(Decimal::ZERO).min(balance);
        balance -= principal_paid;

        schedule.push(AmortizationEntry {
            month,
            payment,
            interest,
            principal: principal_paid,
            remaining_balance: balance,
        });
    }

    Ok(schedule)
}

/// Totals for a generated schedule.
pub fn summarize(schedule: &[AmortizationEntry]) -> FinCalcResult<ScheduleSummary> {
    let mut summary = ScheduleSummary {
        number_of_payments: schedule.len() as u32,
        total_payment: Decimal::ZERO,
        total_interest: Decimal::ZERO,
        total_principal: Decimal::ZERO,
        final_balance: Decimal::ZERO,
    };

    for entry in schedule {
        summary.total_payment = in_range(
            summary.total_payment.checked_add(entry.payment),
            "total payment",
        )?;
        summary.total_interest = in_range(
            summary.total_interest.checked_add(entry.interest),
            "total interest",
        )?;
        summary.total_principal += entry.principal;
        summary.final_balance = entry.remaining_balance;
    }

    Ok(summary)
}

/// Schedule plus totals, wrapped in the standard output envelope.
pub fn build_amortization(
    input: &AmortizationInput,
) -> FinCalcResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = generate_schedule(
        input.principal,
        input.annual_rate_pct,
        input.term_years,
        input.monthly_payment,
    )?;
    let summary = summarize(&schedule)?;

    if let Some(warning) = residual_warning(&summary) {
        warnings.push(warning);
    }

    let output = AmortizationOutput { schedule, summary };
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Level-payment amortization (monthly compounding, balance floored at zero)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Warning text when a schedule ends with more than a rounding residue.
pub(crate) fn residual_warning(summary: &ScheduleSummary) -> Option<String> {
    if summary.final_balance > RESIDUAL_BALANCE_TOLERANCE {
        warn!(
            final_balance = %summary.final_balance,
            "schedule ends with an outstanding balance"
        );
        Some(format!(
            "Schedule ends with an outstanding balance of {}; the payment does not fully amortise the loan over the term",
            summary.final_balance.round_dp(2)
        ))
    } else {
        None
    }
}

fn validate(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: Years,
    monthly_payment: Money,
) -> FinCalcResult<()> {
    let non_negative = [
        ("principal", principal),
        ("annual_rate_pct", annual_rate_pct),
        ("monthly_payment", monthly_payment),
    ];
    for (field, value) in non_negative {
        if value < Decimal::ZERO {
            return Err(FinCalcError::InvalidInput {
                field: field.into(),
                reason: format!("{field} must be >= 0"),
            });
        }
    }
    if term_years <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "term_years".into(),
            reason: "term_years must be > 0".into(),
        });
    }
    if term_years > MAX_TERM_YEARS {
        return Err(FinCalcError::InvalidInput {
            field: "term_years".into(),
            reason: format!("term_years must be <= {MAX_TERM_YEARS}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
