use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::investments::sip::{self, SipInput};
use fincalc_core::investments::swp::{self, SwpInflationInput, SwpInput};
use fincalc_core::DurationUnit;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitArg {
    Years,
    Months,
}

impl From<UnitArg> for DurationUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Years => DurationUnit::Years,
            UnitArg::Months => DurationUnit::Months,
        }
    }
}

/// Arguments for a SIP projection
#[derive(Args)]
pub struct SipArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Lump sum invested up front
    #[arg(long, default_value = "0")]
    pub initial_investment: Decimal,

    /// Contribution at the end of each month
    #[arg(long)]
    pub monthly_contribution: Option<Decimal>,

    /// Plan length, in --unit
    #[arg(long)]
    pub duration: Option<Decimal>,

    /// Unit of --duration
    #[arg(long, value_enum, default_value = "years")]
    pub unit: UnitArg,

    /// Expected annual return in percent
    #[arg(long)]
    pub annual_return: Option<Decimal>,
}

/// Arguments for a level SWP projection
#[derive(Args)]
pub struct SwpArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Corpus at the start of the plan
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// Withdrawal each month
    #[arg(long)]
    pub monthly_withdrawal: Option<Decimal>,

    /// Plan length, in --unit
    #[arg(long)]
    pub duration: Option<Decimal>,

    /// Unit of --duration
    #[arg(long, value_enum, default_value = "years")]
    pub unit: UnitArg,

    /// Expected annual return in percent
    #[arg(long)]
    pub annual_return: Option<Decimal>,
}

/// Arguments for an inflation-adjusted SWP projection
#[derive(Args)]
pub struct SwpInflationArgs {
    #[command(flatten)]
    pub swp: SwpArgs,

    /// Annual inflation in percent
    #[arg(long, default_value = "0")]
    pub inflation_rate: Decimal,
}

pub fn run_sip(args: SipArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sip_input: SipInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        SipInput {
            initial_investment: args.initial_investment,
            monthly_contribution: args
                .monthly_contribution
                .ok_or("--monthly-contribution is required (or provide --input)")?,
            duration: args.duration.ok_or("--duration is required (or provide --input)")?,
            duration_unit: args.unit.into(),
            expected_annual_return: args
                .annual_return
                .ok_or("--annual-return is required (or provide --input)")?,
        }
    };

    let result = sip::project_sip(&sip_input)?;
    Ok(serde_json::to_value(result)?)
}

fn swp_from_flags(args: &SwpArgs) -> Result<SwpInput, Box<dyn std::error::Error>> {
    Ok(SwpInput {
        initial_investment: args
            .initial_investment
            .ok_or("--initial-investment is required (or provide --input)")?,
        monthly_withdrawal: args
            .monthly_withdrawal
            .ok_or("--monthly-withdrawal is required (or provide --input)")?,
        duration: args.duration.ok_or("--duration is required (or provide --input)")?,
        duration_unit: args.unit.into(),
        expected_annual_return: args
            .annual_return
            .ok_or("--annual-return is required (or provide --input)")?,
    })
}

pub fn run_swp(args: SwpArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let swp_input: SwpInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        swp_from_flags(&args)?
    };

    let result = swp::project_swp(&swp_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_swp_inflation(args: SwpInflationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let swp_input: SwpInflationInput = if let Some(ref path) = args.swp.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let level = swp_from_flags(&args.swp)?;
        SwpInflationInput {
            initial_investment: level.initial_investment,
            monthly_withdrawal: level.monthly_withdrawal,
            duration: level.duration,
            duration_unit: level.duration_unit,
            expected_annual_return: level.expected_annual_return,
            inflation_rate: args.inflation_rate,
        }
    };

    let result = swp::project_swp_with_inflation(&swp_input)?;
    Ok(serde_json::to_value(result)?)
}
