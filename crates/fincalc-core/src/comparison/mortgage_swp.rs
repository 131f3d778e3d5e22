use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::time_value::{
    annuity_payment, in_range, monthly_rate, months, schedule_length, MAX_TERM_YEARS,
};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A mortgage serviced entirely from withdrawals on an invested corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageSwpInput {
    pub loan_amount: Money,
    /// Mortgage rate, annual percent.
    pub loan_rate: Percent,
    pub loan_term_years: Years,
    pub investment_amount: Money,
    /// Expected corpus return, annual percent.
    pub investment_return: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageSwpOutput {
    pub emi: Money,
    /// True when the corpus pays every instalment without running dry.
    pub corpus_survives: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depletion_month: Option<u32>,
    pub final_investment: Money,
    pub total_paid: Money,
    pub schedule: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub month: u32,
    pub emi: Money,
    pub remaining_investment: Money,
    pub remaining_loan: Money,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Run the mortgage and the withdrawal plan side by side.
///
/// Each month the corpus earns its monthly return and pays one EMI, while the
/// loan accrues interest and is reduced by the EMI. Reported balances are
/// floored at zero; the corpus keeps its (possibly negative) running value
/// internally so depletion is detected once.
pub fn compare_mortgage_swp(
    input: &MortgageSwpInput,
) -> FinCalcResult<ComputationOutput<MortgageSwpOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate(input)?;

    let loan_rate = monthly_rate(input.loan_rate);
    let investment_rate = monthly_rate(input.investment_return);
    let periods = months(input.loan_term_years);
    let emi = annuity_payment(input.loan_amount, loan_rate, periods)?;
    let total_months = schedule_length(periods)?;

    let mut schedule = Vec::with_capacity(total_months as usize);
    let mut investment = input.investment_amount;
    let mut loan = input.loan_amount;
    let mut depletion_month: Option<u32> = None;

    for month in 1..=total_months {
        investment = in_range(
            investment
                .checked_mul(investment_rate)
                .and_then(|earned| investment.checked_add(earned))
                .and_then(|v| v.checked_sub(emi)),
            "investment balance",
        )?;
        loan = in_range(
            loan.checked_mul(loan_rate)
                .and_then(|interest| loan.checked_add(interest))
                .and_then(|v| v.checked_sub(emi)),
            "loan balance",
        )?;

        if investment < Decimal::ZERO && depletion_month.is_none() {
            depletion_month = Some(month);
        }

        schedule.push(ComparisonRow {
            month,
            emi,
            remaining_investment: investment.max(Decimal::ZERO),
            remaining_loan: loan.max(Decimal::ZERO),
        });
    }

    if let Some(month) = depletion_month {
        warnings.push(format!(
            "Investment corpus cannot cover the EMI from month {month}"
        ));
    }

    let output = MortgageSwpOutput {
        emi,
        corpus_survives: depletion_month.is_none(),
        depletion_month,
        final_investment: investment.max(Decimal::ZERO),
        total_paid: in_range(emi.checked_mul(Decimal::from(total_months)), "total paid")?,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Mortgage EMI funded by a systematic withdrawal plan, monthly compounding on both legs",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate(input: &MortgageSwpInput) -> FinCalcResult<()> {
    let non_negative = [
        ("loan_amount", input.loan_amount),
        ("loan_rate", input.loan_rate),
        ("investment_amount", input.investment_amount),
        ("investment_return", input.investment_return),
    ];
    for (field, value) in non_negative {
        if value < Decimal::ZERO {
            return Err(FinCalcError::InvalidInput {
                field: field.into(),
                reason: format!("{field} must be >= 0"),
            });
        }
    }
    if input.loan_term_years <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "loan_term_years".into(),
            reason: "loan_term_years must be > 0".into(),
        });
    }
    if input.loan_term_years > MAX_TERM_YEARS {
        return Err(FinCalcError::InvalidInput {
            field: "loan_term_years".into(),
            reason: format!("loan_term_years must be <= {MAX_TERM_YEARS}"),
        });
    }
    Ok(())
}
