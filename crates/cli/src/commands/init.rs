//! `init`: write the default configuration into the record store.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};

use fuzzy_rerere_core::config::CONFIG_FILE_NAME;
use fuzzy_rerere_core::RerereConfig;

use super::style;

pub fn run_init(store_root: &Path, force: bool) -> Result<ExitCode> {
    let output = store_root.join(CONFIG_FILE_NAME);

    if output.exists() && !force {
        anyhow::bail!(
            "file already exists: {}. Use --force to replace it.",
            output.display()
        );
    }

    std::fs::write(&output, RerereConfig::default_template())
        .context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!("Default configuration written to {}", output.display()))
    );
    Ok(ExitCode::SUCCESS)
}
