//! `mark`: snapshot conflicted files before they are resolved.

use std::process::ExitCode;

use anyhow::{Context, Result};

use fuzzy_rerere_core::Rerere;

use super::style;

pub fn run_mark(rerere: &Rerere, files: &[String]) -> Result<ExitCode> {
    rerere
        .mark_conflicts(files)
        .context("failed to mark conflicts")?;

    for file in files {
        println!("{}", style::success(&format!("Marked {}", file)));
    }
    println!();
    println!(
        "{}",
        style::dim("Resolve the conflicts, then run 'git fuzzy-rerere save' to record them.")
    );
    Ok(ExitCode::SUCCESS)
}
