//! Subcommand implementations.
//!
//! Each command prints its results through [`style`] and returns the
//! process exit code.

pub mod init;
pub mod mark;
pub mod reapply;
pub mod save;
pub mod status;
pub mod style;

/// Exit code for `reapply` when no file was changed.
pub const EXIT_UNCHANGED: u8 = 1;

/// Exit code for any failure.
pub const EXIT_ERROR: u8 = 2;
