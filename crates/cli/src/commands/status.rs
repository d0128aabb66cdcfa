//! `status`: marked files and recorded resolutions.

use std::process::ExitCode;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use fuzzy_rerere_core::Rerere;

use super::style;

pub fn run_status(rerere: &Rerere) -> Result<ExitCode> {
    let status = rerere.status().context("failed to read record store")?;
    let config = rerere.config();

    println!();
    println!("{}", style::header("git-fuzzy-rerere"));
    println!("{}", "═".repeat(16));
    println!();
    println!("  Store        {}", status.root.display());
    println!("  Resolutions  {}", status.record_count);
    println!(
        "  Matching     similarity >= {}, {} context line(s)",
        config.matching.similarity_threshold, config.matching.context_lines
    );
    println!();

    if status.pending.is_empty() {
        println!("{}", style::success("No marked files"));
        println!();
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "{}",
        style::header(&format!("Marked Files ({})", status.pending.len()))
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["File", "Conflicts"]);
    for pending in &status.pending {
        table.add_row(vec![
            Cell::new(&pending.file_path),
            Cell::new(pending.conflicts),
        ]);
    }

    println!("{}", table);
    println!();
    println!(
        "{}",
        style::dim("Run 'git fuzzy-rerere save' once these files are resolved.")
    );
    println!();
    Ok(ExitCode::SUCCESS)
}
