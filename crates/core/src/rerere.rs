//! The `mark`, `save` and `reapply` commands.
//!
//! A [`Rerere`] owns a [`RecordStore`] handle and the configuration for one
//! invocation. Failures that concern a single file are reported per file;
//! only record store failures abort a command, since carrying on could lose
//! recorded resolutions.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::RerereConfig;
use crate::conflict::{
    ConflictExtractor, ContextSimilarityMatcher, ReapplyResult, Reapplier, ResolutionReconstructor,
};
use crate::errors::{CoreError, RerereError};
use crate::store::{RecordStore, ResolutionRecord};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What `save` did with one snapshot.
#[derive(Debug)]
pub enum SaveOutcome {
    /// Resolutions were recorded and the snapshot consumed.
    Saved {
        /// Regions reconstructed from the snapshot.
        records: usize,
        /// Records that were not already in the store.
        created: usize,
    },
    /// The snapshot held no conflicts and was discarded.
    NoConflicts,
    /// The resolved file could not be read; the snapshot is kept.
    Failed(RerereError),
}

#[derive(Debug)]
pub struct SaveReport {
    pub file_path: String,
    pub outcome: SaveOutcome,
}

/// What `reapply` did with one file.
#[derive(Debug)]
pub enum ReapplyOutcome {
    /// At least one region was replaced.
    Resolved(ReapplyResult),
    /// The file has no conflict regions.
    NoConflicts,
    /// No region had a stored resolution above the threshold.
    NoMatch(ReapplyResult),
    /// The file could not be read or written.
    Failed(RerereError),
}

#[derive(Debug)]
pub struct ReapplyReport {
    pub file_path: String,
    pub outcome: ReapplyOutcome,
}

impl ReapplyReport {
    pub fn modified(&self) -> bool {
        matches!(self.outcome, ReapplyOutcome::Resolved(_))
    }
}

/// A snapshot still waiting for `save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSnapshot {
    pub file_path: String,
    pub conflicts: usize,
}

/// Summary of the record store's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub root: PathBuf,
    pub pending: Vec<PendingSnapshot>,
    pub record_count: usize,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Entry point for the fuzzy rerere commands.
#[derive(Debug)]
pub struct Rerere {
    store: RecordStore,
    config: RerereConfig,
}

impl Rerere {
    pub fn new(store: RecordStore, config: RerereConfig) -> Self {
        Self { store, config }
    }

    /// Validate `config` and open the record store inside `git_dir`.
    pub fn open<P: AsRef<Path>>(git_dir: P, config: RerereConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let store = RecordStore::for_git_dir(git_dir)?;
        Ok(Self::new(store, config))
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn config(&self) -> &RerereConfig {
        &self.config
    }

    fn extractor(&self) -> ConflictExtractor {
        ConflictExtractor::new(self.config.matching.context_lines)
    }

    /// Snapshot the current content of every file in `files`.
    ///
    /// All files are read before any snapshot is written, so an unreadable
    /// file fails the whole call without side effects.
    pub fn mark_conflicts<S: AsRef<str>>(&self, files: &[S]) -> Result<Vec<PathBuf>, RerereError> {
        let mut contents = Vec::with_capacity(files.len());
        for file in files {
            let file = file.as_ref();
            let content = std::fs::read_to_string(file).map_err(|e| RerereError::read(file, e))?;
            contents.push((file, content));
        }

        let extractor = self.extractor();
        let mut snapshots = Vec::with_capacity(contents.len());
        for (file, content) in contents {
            let conflicts = extractor.extract(&content, file).len();
            if conflicts == 0 {
                warn!(file_path = file, "no conflict markers found, snapshot will be discarded on save");
            }
            info!(file_path = file, conflicts, "marking conflicts");
            snapshots.push(self.store.put_snapshot(file, &content)?);
        }
        Ok(snapshots)
    }

    /// Record the resolutions of every outstanding snapshot.
    ///
    /// A snapshot is deleted only after all of its records are written, so
    /// a crash part-way through leaves it in place for the next run.
    pub fn save_resolutions(&self) -> Result<Vec<SaveReport>, RerereError> {
        let extractor = self.extractor();
        let reconstructor = ResolutionReconstructor::from_config(&self.config.reconstruct);

        let mut reports = Vec::new();
        for file_path in self.store.list_snapshots()? {
            let outcome = match self.save_file(&file_path, &extractor, &reconstructor) {
                Ok(outcome) => outcome,
                Err(RerereError::Store(e)) => return Err(e.into()),
                Err(e) => {
                    warn!(file_path = %file_path, error = %e, "could not save resolutions, keeping snapshot");
                    SaveOutcome::Failed(e)
                }
            };
            reports.push(SaveReport { file_path, outcome });
        }
        Ok(reports)
    }

    fn save_file(
        &self,
        file_path: &str,
        extractor: &ConflictExtractor,
        reconstructor: &ResolutionReconstructor,
    ) -> Result<SaveOutcome, RerereError> {
        let pre = self.store.get_snapshot(file_path)?;
        let regions = extractor.extract(&pre, file_path);
        if regions.is_empty() {
            info!(file_path, "snapshot has no conflicts, discarding");
            self.store.delete_snapshot(file_path)?;
            return Ok(SaveOutcome::NoConflicts);
        }

        let post = std::fs::read_to_string(file_path).map_err(|e| RerereError::read(file_path, e))?;
        let reconstruction = reconstructor.reconstruct_all(&pre, &post, &regions);

        let records = regions.len();
        let mut created = 0;
        for (region, resolution) in regions.into_iter().zip(reconstruction.resolutions) {
            if self.store.put_record(&ResolutionRecord::new(region, resolution))?.created {
                created += 1;
            }
        }

        self.store.delete_snapshot(file_path)?;
        info!(file_path, records, created, "saved resolutions");
        Ok(SaveOutcome::Saved { records, created })
    }

    /// Replace conflicts in `files` with matching stored resolutions.
    ///
    /// With `dry_run` set, files are left as they are but the reports still
    /// carry the content that would have been written.
    pub fn reapply_resolutions<S: AsRef<str>>(
        &self,
        files: &[S],
        dry_run: bool,
    ) -> Result<Vec<ReapplyReport>, RerereError> {
        let extractor = self.extractor();
        let reapplier = Reapplier::new(
            &self.store,
            ContextSimilarityMatcher::new(self.config.matching.similarity_threshold),
        );

        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            let file_path = file.as_ref().to_string();
            let outcome = match self.reapply_file(&file_path, &extractor, &reapplier, dry_run) {
                Ok(outcome) => outcome,
                Err(RerereError::Store(e)) => return Err(e.into()),
                Err(e) => {
                    warn!(file_path = %file_path, error = %e, "could not reapply resolutions");
                    ReapplyOutcome::Failed(e)
                }
            };
            reports.push(ReapplyReport { file_path, outcome });
        }
        Ok(reports)
    }

    fn reapply_file(
        &self,
        file_path: &str,
        extractor: &ConflictExtractor,
        reapplier: &Reapplier<'_>,
        dry_run: bool,
    ) -> Result<ReapplyOutcome, RerereError> {
        let content = std::fs::read_to_string(file_path).map_err(|e| RerereError::read(file_path, e))?;
        let regions = extractor.extract(&content, file_path);
        if regions.is_empty() {
            debug!(file_path, "no conflicts to reapply");
            return Ok(ReapplyOutcome::NoConflicts);
        }

        let result = reapplier.reapply(&content, &regions)?;
        if !result.changed() {
            info!(file_path, unmatched = result.unmatched.len(), "no matching resolutions");
            return Ok(ReapplyOutcome::NoMatch(result));
        }

        if dry_run {
            debug!(file_path, "dry run, not writing");
        } else {
            std::fs::write(file_path, &result.updated).map_err(|e| RerereError::WriteFailed {
                path: file_path.to_string(),
                source: e,
            })?;
        }
        info!(
            file_path,
            applied = result.applied.len(),
            unmatched = result.unmatched.len(),
            "reapplied resolutions"
        );
        Ok(ReapplyOutcome::Resolved(result))
    }

    /// Outstanding snapshots and the number of stored records.
    pub fn status(&self) -> Result<StoreStatus, RerereError> {
        let extractor = self.extractor();
        let mut pending = Vec::new();
        for file_path in self.store.list_snapshots()? {
            let snapshot = self.store.get_snapshot(&file_path)?;
            let conflicts = extractor.extract(&snapshot, &file_path).len();
            pending.push(PendingSnapshot { file_path, conflicts });
        }
        Ok(StoreStatus {
            root: self.store.root().to_path_buf(),
            pending,
            record_count: self.store.list_records()?.len(),
        })
    }
}
