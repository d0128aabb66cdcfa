//! Fuzzy rerere core library.
//!
//! Records how merge conflicts were resolved and replays those resolutions
//! onto later conflicts whose surrounding context is similar, even when the
//! conflict sits at a different line or in a different file.
//!
//! The pieces are: conflict extraction, the on-disk record store,
//! resolution reconstruction, similarity matching, and the [`Rerere`]
//! orchestrator that ties them into the mark / save / reapply commands.

pub mod config;
pub mod conflict;
pub mod errors;
pub mod rerere;
pub mod store;

// Re-exports for convenience.
pub use config::RerereConfig;
pub use conflict::{ConflictExtractor, ConflictRegion};
pub use errors::CoreError;
pub use rerere::{ReapplyOutcome, ReapplyReport, Rerere, SaveOutcome, SaveReport, StoreStatus};
pub use store::RecordStore;
