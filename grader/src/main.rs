use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use grader::cli::{RunArgs, print_contract, run_grading};
use grader::{exit_codes, logging};

#[derive(Parser)]
#[command(
    name = "grader",
    version,
    about = "Grading harness for fitness tracker candidates"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grade a candidate executable and write the report.
    Run {
        /// Candidate executable (default: `solution` beside the config).
        solution: Option<PathBuf>,
        /// Text report path (default: `report.txt`).
        #[arg(long)]
        report: Option<PathBuf>,
        /// JSON summary path (default: `report.json`).
        #[arg(long)]
        summary: Option<PathBuf>,
        /// Per-call timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,
        /// Config file (default: `grader.toml` if present).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the manifest a candidate's `describe` must return.
    Contract,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            solution,
            report,
            summary,
            timeout,
            config,
        } => {
            let workdir = std::env::current_dir()?;
            let args = RunArgs {
                solution,
                report,
                summary,
                timeout_secs: timeout,
                config,
            };
            run_grading(&workdir, args)
        }
        Command::Contract => {
            print_contract()?;
            Ok(exit_codes::OK)
        }
    }
}
