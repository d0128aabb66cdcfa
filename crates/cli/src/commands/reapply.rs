//! `reapply`: replace conflicts with matching recorded resolutions.

use std::process::ExitCode;

use anyhow::{Context, Result};

use fuzzy_rerere_core::conflict::ReapplyResult;
use fuzzy_rerere_core::{ReapplyOutcome, ReapplyReport, Rerere};

use super::{style, EXIT_ERROR, EXIT_UNCHANGED};

pub fn run_reapply(rerere: &Rerere, files: &[String], dry_run: bool) -> Result<ExitCode> {
    let reports = rerere
        .reapply_resolutions(files, dry_run)
        .context("failed to reapply resolutions")?;

    for report in &reports {
        print_report(report, dry_run);
    }

    let code = exit_code(&reports);
    let modified = reports.iter().filter(|r| r.modified()).count();
    println!();
    if dry_run {
        println!(
            "{}",
            style::dim(&format!("{} file(s) would be modified (dry run)", modified))
        );
    } else {
        println!("{}", style::dim(&format!("{} file(s) modified", modified)));
    }
    Ok(ExitCode::from(code))
}

/// 0 if any file was resolved, 1 if nothing changed, 2 if any file failed.
fn exit_code(reports: &[ReapplyReport]) -> u8 {
    if reports
        .iter()
        .any(|r| matches!(r.outcome, ReapplyOutcome::Failed(_)))
    {
        EXIT_ERROR
    } else if reports.iter().any(ReapplyReport::modified) {
        0
    } else {
        EXIT_UNCHANGED
    }
}

fn print_report(report: &ReapplyReport, dry_run: bool) {
    let file = &report.file_path;
    match &report.outcome {
        ReapplyOutcome::Resolved(result) => {
            let verb = if dry_run { "would resolve" } else { "resolved" };
            println!(
                "{}",
                style::success(&format!(
                    "{}: {} {} of {} conflict(s)",
                    file,
                    verb,
                    result.applied.len(),
                    result.applied.len() + result.unmatched.len()
                ))
            );
            print_regions(result);
            if dry_run {
                println!();
                print!("{}", diffy::create_patch(&result.original, &result.updated));
            }
        }
        ReapplyOutcome::NoConflicts => {
            println!("{}", style::dim(&format!("{}: no conflicts", file)));
        }
        ReapplyOutcome::NoMatch(result) => {
            println!(
                "{}",
                style::warn(&format!(
                    "{}: no recorded resolution matched {} conflict(s)",
                    file,
                    result.unmatched.len()
                ))
            );
            print_regions(result);
        }
        ReapplyOutcome::Failed(e) => {
            println!("{}", style::error(&format!("{}: {}", file, e)));
        }
    }
}

/// One line per region, in file order, with 1-based line numbers.
fn print_regions(result: &ReapplyResult) {
    let mut lines: Vec<(usize, String)> = result
        .applied
        .iter()
        .map(|a| {
            (
                a.start_line,
                format!(
                    "line {}: {} match from {}:{}",
                    a.start_line + 1,
                    style::confidence(a.confidence),
                    a.source_file,
                    a.source_line + 1
                ),
            )
        })
        .chain(result.unmatched.iter().map(|r| {
            (
                r.start_line,
                format!("line {}: {}", r.start_line + 1, style::dim("left unresolved")),
            )
        }))
        .collect();
    lines.sort_by_key(|(line, _)| *line);

    for (_, text) in lines {
        println!("    {}", text);
    }
}
