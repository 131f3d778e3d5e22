use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::comparison::mortgage_swp::{self, MortgageSwpInput};

use crate::input;

/// Arguments for the mortgage-vs-SWP comparison
#[derive(Args)]
pub struct MortgageSwpArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Mortgage principal
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Mortgage rate, annual percent
    #[arg(long)]
    pub loan_rate: Option<Decimal>,

    /// Mortgage term in years
    #[arg(long)]
    pub term_years: Option<Decimal>,

    /// Corpus funding the EMIs
    #[arg(long)]
    pub investment_amount: Option<Decimal>,

    /// Expected corpus return, annual percent
    #[arg(long)]
    pub investment_return: Option<Decimal>,
}

pub fn run_mortgage_swp(args: MortgageSwpArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cmp_input: MortgageSwpInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        MortgageSwpInput {
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required (or provide --input)")?,
            loan_rate: args
                .loan_rate
                .ok_or("--loan-rate is required (or provide --input)")?,
            loan_term_years: args
                .term_years
                .ok_or("--term-years is required (or provide --input)")?,
            investment_amount: args
                .investment_amount
                .ok_or("--investment-amount is required (or provide --input)")?,
            investment_return: args
                .investment_return
                .ok_or("--investment-return is required (or provide --input)")?,
        }
    };

    let result = mortgage_swp::compare_mortgage_swp(&cmp_input)?;
    Ok(serde_json::to_value(result)?)
}
