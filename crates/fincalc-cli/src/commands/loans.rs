use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::loans::amortization::{self, AmortizationInput};
use fincalc_core::loans::analysis::{self, LoanAnalysisInput};
use fincalc_core::loans::solver::{self, LoanRecord, RateSearchConfig};

use crate::input;

/// Loan fields shared by the solve and analysis commands. Leave exactly one
/// of amount, rate, term and payment unset.
#[derive(Args)]
pub struct LoanFieldArgs {
    /// Loan amount before the down payment
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 6 for 6%)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub term_years: Option<Decimal>,

    /// Down payment subtracted from the loan amount
    #[arg(long, default_value = "0")]
    pub down_payment: Decimal,

    /// Monthly payment
    #[arg(long)]
    pub monthly_payment: Option<Decimal>,

    /// Upper bound of the interest-rate search, in percent
    #[arg(long, default_value = "20")]
    pub max_rate: Decimal,
}

impl LoanFieldArgs {
    fn to_input(&self) -> LoanAnalysisInput {
        LoanAnalysisInput {
            record: LoanRecord {
                loan_amount: self.loan_amount,
                interest_rate: self.interest_rate,
                loan_term_years: self.term_years,
                down_payment: self.down_payment,
                monthly_payment: self.monthly_payment,
            },
            rate_search: RateSearchConfig {
                upper_bound: self.max_rate,
                ..RateSearchConfig::default()
            },
        }
    }
}

/// Arguments for solving the missing loan field
#[derive(Args)]
pub struct LoanSolveArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub fields: LoanFieldArgs,
}

/// Arguments for a full loan analysis (solve + schedule)
#[derive(Args)]
pub struct LoanAnalysisArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub fields: LoanFieldArgs,
}

/// Arguments for an amortization schedule of a resolved loan
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Principal after down payment
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub term_years: Option<Decimal>,

    /// Monthly payment
    #[arg(long)]
    pub monthly_payment: Option<Decimal>,
}

fn read_loan_input(
    path: &Option<String>,
    fields: &LoanFieldArgs,
) -> Result<LoanAnalysisInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Ok(fields.to_input())
    }
}

pub fn run_loan_solve(args: LoanSolveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input = read_loan_input(&args.input, &args.fields)?;
    let solution = solver::solve_with(&loan_input.record, &loan_input.rate_search)?;

    let warnings: Vec<String> = solution
        .rate_search
        .as_ref()
        .and_then(|report| report.warning(&loan_input.rate_search))
        .into_iter()
        .collect();

    Ok(serde_json::json!({
        "result": serde_json::to_value(&solution.record)?,
        "solved_for": serde_json::to_value(solution.solved_for)?,
        "rate_search": serde_json::to_value(&solution.rate_search)?,
        "warnings": warnings,
    }))
}

pub fn run_loan_analysis(args: LoanAnalysisArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input = read_loan_input(&args.input, &args.fields)?;
    let result = analysis::analyze_loan(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let amort_input: AmortizationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        AmortizationInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args
                .term_years
                .ok_or("--term-years is required (or provide --input)")?,
            monthly_payment: args
                .monthly_payment
                .ok_or("--monthly-payment is required (or provide --input)")?,
        }
    };

    let result = amortization::build_amortization(&amort_input)?;
    Ok(serde_json::to_value(result)?)
}
