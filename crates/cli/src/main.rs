//! git-fuzzy-rerere command-line tool.
//!
//! Records how merge conflicts were resolved and replays those resolutions
//! onto later conflicts with similar surrounding context. Run `mark` on the
//! conflicted files before resolving them, `save` after, and `reapply` on
//! the next merge that produces the same conflicts.

mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use fuzzy_rerere_core::config::CONFIG_FILE_NAME;
use fuzzy_rerere_core::store::STORE_DIR_NAME;
use fuzzy_rerere_core::{RecordStore, Rerere, RerereConfig};

use commands::EXIT_ERROR;

/// Directory under the user config directory holding the global config.
const USER_CONFIG_DIR: &str = "git-fuzzy-rerere";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Reuse recorded conflict resolutions on similar merge conflicts.
#[derive(Parser, Debug)]
#[command(
    name = "git-fuzzy-rerere",
    version,
    about = "Reuse recorded conflict resolutions on similar merge conflicts"
)]
struct Cli {
    /// Repository metadata directory. Discovered from the current directory
    /// when omitted.
    #[arg(long, global = true)]
    git_dir: Option<PathBuf>,

    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Minimum context similarity (0.0 to 1.0) for a recorded resolution to
    /// be applied.
    #[arg(long, global = true)]
    similarity: Option<f64>,

    /// Number of lines of context captured on each side of a conflict.
    #[arg(long, global = true)]
    context: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Snapshot conflicted files before resolving them.
    #[command(alias = "mark_conflicts")]
    Mark {
        /// Files containing conflict markers.
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Record the resolutions of every marked file.
    #[command(alias = "save_resolutions")]
    Save,

    /// Replace conflicts with matching recorded resolutions.
    #[command(alias = "reapply_resolutions")]
    Reapply {
        /// Files containing conflict markers.
        #[arg(required = true)]
        files: Vec<String>,

        /// Print the changes as a diff instead of writing them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show marked files and the number of recorded resolutions.
    Status,

    /// Write a default configuration file into the record store.
    Init {
        /// Replace an existing configuration file.
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so that `reapply --dry-run` output can be piped.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let git_dir = resolve_git_dir(cli.git_dir.as_deref())?;

    if let Commands::Init { force } = cli.command {
        let store = RecordStore::for_git_dir(&git_dir).context("failed to open record store")?;
        return commands::init::run_init(store.root(), force);
    }

    let config = load_config(
        cli.config.as_deref(),
        &config_candidates(&git_dir.join(STORE_DIR_NAME)),
        cli.similarity,
        cli.context,
    )?;
    let rerere = Rerere::open(&git_dir, config)
        .with_context(|| format!("failed to open {}", git_dir.display()))?;

    match cli.command {
        Commands::Mark { files } => commands::mark::run_mark(&rerere, &files),
        Commands::Save => commands::save::run_save(&rerere),
        Commands::Reapply { files, dry_run } => {
            commands::reapply::run_reapply(&rerere, &files, dry_run)
        }
        Commands::Status => commands::status::run_status(&rerere),
        Commands::Init { .. } => unreachable!(),
    }
}

// ---------------------------------------------------------------------------
// Repository and config helpers
// ---------------------------------------------------------------------------

fn resolve_git_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    let repo = git2::Repository::discover(".")
        .context("not inside a git repository (use --git-dir to name one)")?;
    debug!(git_dir = %repo.path().display(), "discovered repository");
    Ok(repo.path().to_path_buf())
}

/// Config files consulted, in order, when `--config` is not given.
fn config_candidates(store_root: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![store_root.join(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join(USER_CONFIG_DIR).join(CONFIG_FILE_NAME));
    }
    candidates
}

/// Load the effective configuration.
///
/// An explicit path must exist. Otherwise the first existing candidate is
/// used, falling back to defaults. Command-line overrides are applied last;
/// [`Rerere::open`] validates the result.
fn load_config(
    explicit: Option<&Path>,
    candidates: &[PathBuf],
    similarity: Option<f64>,
    context: Option<usize>,
) -> Result<RerereConfig> {
    let mut config = match explicit.or_else(|| candidates.iter().map(PathBuf::as_path).find(|p| p.is_file())) {
        Some(path) => RerereConfig::load_from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => RerereConfig::default(),
    };

    if let Some(threshold) = similarity {
        config.matching.similarity_threshold = threshold;
    }
    if let Some(lines) = context {
        config.matching.context_lines = lines;
    }
    Ok(config)
}
