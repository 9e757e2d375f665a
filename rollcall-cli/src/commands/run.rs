//! `rollcall --add | --delete | --clean`: run the engine and print the tallies.

use anyhow::Result;
use colored::Colorize;

use rollcall_sync::{Mode, Phase, RunReport, RunTally};

use super::confirm::TerminalConfirm;
use super::{config, RunStatus};

pub fn run(mode: Mode) -> Result<RunStatus> {
    let config = config::load()?;
    let mut confirm = TerminalConfirm;
    let report = rollcall_sync::run(&config, mode, &mut confirm)?;

    print_report(&report);

    if report.phase_failed() {
        Ok(RunStatus::PhaseFailed)
    } else {
        Ok(RunStatus::Completed)
    }
}

fn print_report(report: &RunReport) {
    for tally in &report.tallies {
        print_tally(tally);
    }

    if let Some(err) = &report.content_share_error {
        println!(
            "{} content share phase skipped: {}",
            "✗".red(),
            err.red()
        );
    }

    let elapsed = report.finished_at - report.started_at;
    println!(
        "{} in {}s, {} failure(s)",
        "Done".bold(),
        elapsed.num_seconds(),
        report.failure_count()
    );
}

fn print_tally(tally: &RunTally) {
    let line = tally.summary_line();
    if tally.failures.is_empty() {
        println!("{} {}", "✓".green(), line);
    } else {
        println!("{} {}", "!".yellow(), line.yellow());
    }

    if tally.skipped > 0 {
        println!("  {} {}", tally.skipped, skip_label(tally.phase));
    }
    if tally.interrupted {
        println!("  {}", "stopped early: run deadline reached".yellow());
    }
    for failure in &tally.failures {
        println!(
            "  {} {} [{} / {}]: {}",
            "✗".red(),
            failure.person,
            failure.step,
            failure.system,
            failure.message
        );
    }
}

/// Clean mode never offers protected ids, so its skips are declined prompts.
fn skip_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Clean => "declined at the prompt",
        Phase::Directories | Phase::ContentShare => "skipped (protected)",
    }
}
