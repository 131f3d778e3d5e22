use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::loans::amortization::{
    generate_schedule, residual_warning, summarize, AmortizationEntry, ScheduleSummary,
};
use crate::loans::solver::{solve_with, LoanRecord, LoanSolution, RateSearchConfig};
use crate::time_value::in_range;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::FinCalcResult;

/// A partially specified loan plus optional rate-search tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysisInput {
    #[serde(flatten)]
    pub record: LoanRecord,
    #[serde(default)]
    pub rate_search: RateSearchConfig,
}

/// Resolved loan, its schedule and headline totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysis {
    pub solution: LoanSolution,
    /// Loan amount less down payment.
    pub financed_principal: Money,
    /// Sum of the payments actually charged, which stop once the loan is repaid.
    pub total_payment: Money,
    pub total_interest: Money,
    /// Total payments plus the down payment.
    pub total_cost: Money,
    pub summary: ScheduleSummary,
    pub schedule: Vec<AmortizationEntry>,
}

/// Solve the missing field, then amortise the resolved loan.
pub fn analyze_loan(input: &LoanAnalysisInput) -> FinCalcResult<ComputationOutput<LoanAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let solution = solve_with(&input.record, &input.rate_search)?;
    if let Some(warning) = solution
        .rate_search
        .as_ref()
        .and_then(|report| report.warning(&input.rate_search))
    {
        warnings.push(warning);
    }

    let record = &solution.record;
    let (Some(principal), Some(rate), Some(term), Some(payment)) = (
        record.financed_principal(),
        record.interest_rate,
        record.loan_term_years,
        record.monthly_payment,
    ) else {
        return Err(FinCalcError::InsufficientData(
            "solved loan record is missing a field".into(),
        ));
    };

    let schedule = generate_schedule(principal, rate, term, payment)?;
    let summary = summarize(&schedule)?;
    if let Some(warning) = residual_warning(&summary) {
        warnings.push(warning);
    }

    let total_cost = in_range(
        summary.total_payment.checked_add(record.down_payment),
        "total cost",
    )?;

    let analysis = LoanAnalysis {
        financed_principal: principal,
        total_payment: summary.total_payment,
        total_interest: summary.total_interest,
        total_cost,
        solution,
        summary,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annuity-formula loan solve (bisection for rate) with level-payment amortization",
        input,
        warnings,
        elapsed,
        analysis,
    ))
}
