mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::comparison::MortgageSwpArgs;
use commands::investments::{SipArgs, SwpArgs, SwpInflationArgs};
use commands::loans::{AmortizeArgs, LoanAnalysisArgs, LoanSolveArgs};

/// Personal-finance calculators
#[derive(Parser)]
#[command(
    name = "fincalc",
    version,
    about = "Personal-finance calculators with decimal precision",
    long_about = "A CLI for personal-finance calculations with decimal precision. \
                  Solves any missing loan field (amount, rate, term or payment), \
                  builds amortization schedules, and projects SIP, SWP and \
                  mortgage-vs-SWP scenarios."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log solver decisions to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the one missing loan field (amount, rate, term or payment)
    LoanSolve(LoanSolveArgs),
    /// Solve the missing loan field and build its amortization schedule
    LoanAnalysis(LoanAnalysisArgs),
    /// Amortization schedule for a fully specified loan
    Amortize(AmortizeArgs),
    /// Systematic investment plan projection
    Sip(SipArgs),
    /// Systematic withdrawal plan projection
    Swp(SwpArgs),
    /// Systematic withdrawal plan with inflation-indexed withdrawals
    SwpInflation(SwpInflationArgs),
    /// Fund a mortgage's EMIs from a systematic withdrawal plan
    MortgageSwp(MortgageSwpArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "fincalc_core=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // stdout carries the result, so logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::LoanSolve(args) => commands::loans::run_loan_solve(args),
        Commands::LoanAnalysis(args) => commands::loans::run_loan_analysis(args),
        Commands::Amortize(args) => commands::loans::run_amortize(args),
        Commands::Sip(args) => commands::investments::run_sip(args),
        Commands::Swp(args) => commands::investments::run_swp(args),
        Commands::SwpInflation(args) => commands::investments::run_swp_inflation(args),
        Commands::MortgageSwp(args) => commands::comparison::run_mortgage_swp(args),
        Commands::Version => {
            println!("fincalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
