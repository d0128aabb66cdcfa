//! `save`: record the resolutions of every marked file.

use std::process::ExitCode;

use anyhow::{Context, Result};

use fuzzy_rerere_core::{Rerere, SaveOutcome};

use super::{style, EXIT_ERROR};

pub fn run_save(rerere: &Rerere) -> Result<ExitCode> {
    let reports = rerere
        .save_resolutions()
        .context("failed to save resolutions")?;

    if reports.is_empty() {
        println!(
            "{}",
            style::warn("Nothing to save. Run 'git fuzzy-rerere mark <files>' before resolving.")
        );
        return Ok(ExitCode::SUCCESS);
    }

    let mut failed = false;
    for report in &reports {
        match &report.outcome {
            SaveOutcome::Saved { records, created } => println!(
                "{}",
                style::success(&format!(
                    "{}: recorded {} resolution(s), {} new",
                    report.file_path, records, created
                ))
            ),
            SaveOutcome::NoConflicts => println!(
                "{}",
                style::dim(&format!("{}: no conflicts in snapshot, discarded", report.file_path))
            ),
            SaveOutcome::Failed(e) => {
                failed = true;
                println!(
                    "{}",
                    style::error(&format!("{}: {} (snapshot kept)", report.file_path, e))
                );
            }
        }
    }

    Ok(if failed {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::SUCCESS
    })
}
