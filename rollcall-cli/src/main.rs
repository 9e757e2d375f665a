//! Rollcall: reconcile the roster feed against every downstream directory.
//!
//! # Usage
//!
//! ```text
//! rollcall --add      provision every roster person
//! rollcall --delete   deprovision every roster person
//! rollcall --clean    remove accounts the roster no longer lists
//! rollcall --list     print the roster
//! rollcall --help
//! ```
//!
//! Exit codes: 0 done (individual failures are in the tally), 1 help,
//! 2 fatal error or lost content-share phase, 3 usage error.

mod commands;

use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use colored::Colorize;

use commands::RunStatus;
use rollcall_sync::Mode;

const USAGE: &str = "\
Usage: rollcall <--add | --delete | --clean | --list | --help>

Modes:
  --add       Provision roster persons into the identity provider, business apps and content share
  --delete    Remove roster persons from every downstream system
  --clean     Remove accounts that are provisioned but absent from the roster (asks per account)
  --list      Print the roster with resolved manager emails
  -h, --help  Print this help

Environment:
  ROLLCALL_CONFIG        Config file (default ./rollcall.yaml)
  ROLLCALL_SECRETS_DIR   Resolve [vault] secrets from files in this directory
  ROLLCALL_SECRET_<ID>   Resolve [vault] secrets from the environment
  RUST_LOG               Log filter (default info)";

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "rollcall",
    about = "Reconcile the roster feed against downstream directories",
    disable_help_flag = true,
    disable_version_flag = true
)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .multiple(false)
        .args(["add", "delete", "clean", "list", "help"])
))]
struct Cli {
    #[arg(long)]
    add: bool,
    #[arg(long)]
    delete: bool,
    #[arg(long)]
    clean: bool,
    #[arg(long)]
    list: bool,
    #[arg(short = 'h', long)]
    help: bool,
}

enum Action {
    Help,
    List,
    Run(Mode),
}

impl Cli {
    fn action(&self) -> Action {
        if self.help {
            Action::Help
        } else if self.list {
            Action::List
        } else if self.delete {
            Action::Run(Mode::Delete)
        } else if self.clean {
            Action::Run(Mode::Clean)
        } else {
            Action::Run(Mode::Add)
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{}", USAGE.lines().next().unwrap_or_default());
            return ExitCode::from(3);
        }
    };

    let result = match cli.action() {
        Action::Help => {
            println!("{USAGE}");
            return ExitCode::from(1);
        }
        Action::List => {
            init_tracing();
            commands::list::run()
        }
        Action::Run(mode) => {
            init_tracing();
            commands::run::run(mode)
        }
    };

    match result {
        Ok(RunStatus::Completed) => ExitCode::SUCCESS,
        Ok(RunStatus::PhaseFailed) => ExitCode::from(2),
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}
