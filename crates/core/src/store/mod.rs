//! On-disk record store.
//!
//! All persistent state lives in one directory (normally
//! `<git-dir>/fuzzy-rerere`). Two kinds of files are kept there:
//!
//! - `<fingerprint>_<record_hash>.json` -- one immutable [`ResolutionRecord`]
//!   per file, named by its [`RecordKey`].
//! - `<encoded path>.pre` -- the pre-resolution snapshot of a file that is
//!   currently being resolved.
//!
//! Every write goes to a temporary file in the same directory, is synced,
//! then renamed into place.

pub mod record;

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::errors::StoreError;

pub use record::{fingerprint, record_hash, RecordKey, ResolutionRecord};

/// Name of the store directory inside the repository's metadata directory.
pub const STORE_DIR_NAME: &str = "fuzzy-rerere";

const SNAPSHOT_EXTENSION: &str = "pre";
const RECORD_EXTENSION: &str = "json";

/// A record together with the key it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub key: RecordKey,
    pub record: ResolutionRecord,
}

/// Result of [`RecordStore::put_record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutcome {
    pub key: RecordKey,
    /// `false` when a record with the same key already existed.
    pub created: bool,
}

/// Directory-backed store for resolution records and snapshots.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        debug!(root = %root.display(), "opened record store");
        Ok(Self { root })
    }

    /// Open the store kept inside a repository metadata directory.
    pub fn for_git_dir<P: AsRef<Path>>(git_dir: P) -> Result<Self, StoreError> {
        Self::open(git_dir.as_ref().join(STORE_DIR_NAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Path of the snapshot file for `file_path`.
    pub fn snapshot_path(&self, file_path: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", encode_file_id(file_path), SNAPSHOT_EXTENSION))
    }

    /// Store the pre-resolution content of `file_path`, replacing any
    /// earlier snapshot of the same file.
    pub fn put_snapshot(&self, file_path: &str, content: &str) -> Result<PathBuf, StoreError> {
        let path = self.snapshot_path(file_path);
        self.write_atomic(&path, content.as_bytes(), true)?;
        info!(file_path, snapshot = %path.display(), "saved pre-resolution snapshot");
        Ok(path)
    }

    pub fn get_snapshot(&self, file_path: &str) -> Result<String, StoreError> {
        let path = self.snapshot_path(file_path);
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::SnapshotNotFound(file_path.to_string()),
            _ => StoreError::io(&path, e),
        })
    }

    pub fn delete_snapshot(&self, file_path: &str) -> Result<(), StoreError> {
        let path = self.snapshot_path(file_path);
        std::fs::remove_file(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::SnapshotNotFound(file_path.to_string()),
            _ => StoreError::io(&path, e),
        })?;
        debug!(file_path, "deleted snapshot");
        Ok(())
    }

    /// File paths of every outstanding snapshot, sorted.
    pub fn list_snapshots(&self) -> Result<Vec<String>, StoreError> {
        let suffix = format!(".{}", SNAPSHOT_EXTENSION);
        let mut files: Vec<String> = self
            .file_names()?
            .iter()
            .filter_map(|name| name.strip_suffix(&suffix))
            .map(decode_file_id)
            .collect();
        files.sort();
        Ok(files)
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    /// Persist `record` under its content key.
    ///
    /// An existing record with the same key is never overwritten; writing it
    /// again is a no-op reported through [`PutOutcome::created`].
    pub fn put_record(&self, record: &ResolutionRecord) -> Result<PutOutcome, StoreError> {
        let key = record.key();
        let path = self.record_path(&key);
        let json = serde_json::to_vec_pretty(record)?;
        let created = self.write_atomic(&path, &json, false)?;
        if created {
            info!(%key, file_path = %record.region.file_path, "saved resolution record");
        } else {
            debug!(%key, "resolution record already stored");
        }
        Ok(PutOutcome { key, created })
    }

    /// All records whose conflict body is `conflict_text`, in key order.
    ///
    /// Only files carrying the body's fingerprint are read. Unparseable
    /// records are skipped with a warning.
    pub fn find_by_fingerprint(&self, conflict_text: &str) -> Result<Vec<StoredRecord>, StoreError> {
        let prefix = format!("{}_", fingerprint(conflict_text));
        let records: Vec<StoredRecord> = self
            .load_records(|name| name.starts_with(&prefix))?
            .into_iter()
            .filter(|stored| {
                let same = stored.record.region.conflict_text == conflict_text;
                if !same {
                    debug!(key = %stored.key, "fingerprint collision, skipping record");
                }
                same
            })
            .collect();
        debug!(count = records.len(), "found candidate records");
        Ok(records)
    }

    /// Every parseable record in the store, in key order.
    pub fn list_records(&self) -> Result<Vec<StoredRecord>, StoreError> {
        self.load_records(|_| true)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn record_path(&self, key: &RecordKey) -> PathBuf {
        self.root.join(format!("{}.{}", key, RECORD_EXTENSION))
    }

    fn file_names(&self) -> Result<Vec<String>, StoreError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn load_records<F>(&self, filter: F) -> Result<Vec<StoredRecord>, StoreError>
    where
        F: Fn(&str) -> bool,
    {
        let suffix = format!(".{}", RECORD_EXTENSION);
        let mut keys: Vec<RecordKey> = self
            .file_names()?
            .iter()
            .filter_map(|name| name.strip_suffix(&suffix))
            .filter(|stem| filter(*stem))
            .filter_map(RecordKey::parse)
            .collect();
        keys.sort();

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            match self.read_record(&key) {
                Ok(record) => records.push(StoredRecord { key, record }),
                Err(err @ StoreError::MalformedRecord { .. }) => {
                    warn!(error = %err, "skipping malformed record");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(records)
    }

    fn read_record(&self, key: &RecordKey) -> Result<ResolutionRecord, StoreError> {
        let path = self.record_path(key);
        let contents = std::fs::read(&path).map_err(|e| StoreError::io(&path, e))?;
        serde_json::from_slice(&contents).map_err(|e| StoreError::MalformedRecord {
            path,
            detail: e.to_string(),
        })
    }

    /// Write `contents` to `path` through a synced temporary file.
    ///
    /// Returns `false` if `overwrite` is unset and `path` already exists.
    fn write_atomic(&self, path: &Path, contents: &[u8], overwrite: bool) -> Result<bool, StoreError> {
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        tmp.write_all(contents).map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(tmp.path(), e))?;

        if overwrite {
            tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;
            return Ok(true);
        }
        match tmp.persist_noclobber(path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(StoreError::io(path, e.error)),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot file ids
// ---------------------------------------------------------------------------

/// Encode a file path into a single file name component.
///
/// `/` becomes `%2F`, `\` becomes `%5C` and literal `%` becomes `%25`, so
/// the mapping is reversible with [`decode_file_id`].
pub fn encode_file_id(file_path: &str) -> String {
    let mut id = String::with_capacity(file_path.len());
    for c in file_path.chars() {
        match c {
            '%' => id.push_str("%25"),
            '/' => id.push_str("%2F"),
            '\\' => id.push_str("%5C"),
            other => id.push(other),
        }
    }
    id
}

/// Inverse of [`encode_file_id`].
pub fn decode_file_id(file_id: &str) -> String {
    let mut path = String::with_capacity(file_id.len());
    let mut rest = file_id;
    while let Some(pos) = rest.find('%') {
        path.push_str(&rest[..pos]);
        let escape = &rest[pos..];
        if escape.starts_with("%2F") {
            path.push('/');
            rest = &escape[3..];
        } else if escape.starts_with("%5C") {
            path.push('\\');
            rest = &escape[3..];
        } else if escape.starts_with("%25") {
            path.push('%');
            rest = &escape[3..];
        } else {
            path.push('%');
            rest = &escape[1..];
        }
    }
    path.push_str(rest);
    path
}
