//! Resolution records and their content-addressed keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::conflict::ConflictRegion;

/// Number of hex characters kept from each SHA-256 digest.
const HASH_LEN: usize = 16;

/// A persisted memo of one conflict region and the text that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    #[serde(flatten)]
    pub region: ConflictRegion,
    /// The literal text (possibly empty) a human put in place of the region.
    pub resolution: String,
    /// When the record was written. Not part of the record's identity.
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl ResolutionRecord {
    pub fn new(region: ConflictRegion, resolution: impl Into<String>) -> Self {
        Self {
            region,
            resolution: resolution.into(),
            recorded_at: Some(Utc::now()),
        }
    }

    /// The record's two-level key: conflict fingerprint, then a hash over
    /// the conflict, its context, its line range and the resolution.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            fingerprint: fingerprint(&self.region.conflict_text),
            record_hash: record_hash(&self.region, &self.resolution),
        }
    }
}

/// Two-level identity of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub fingerprint: String,
    pub record_hash: String,
}

impl RecordKey {
    /// Parse a key from its `<fingerprint>_<record_hash>` form.
    pub fn parse(s: &str) -> Option<Self> {
        let (fingerprint, record_hash) = s.split_once('_')?;
        if fingerprint.is_empty() || record_hash.is_empty() {
            return None;
        }
        Some(Self {
            fingerprint: fingerprint.to_string(),
            record_hash: record_hash.to_string(),
        })
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.fingerprint, self.record_hash)
    }
}

/// Fingerprint of a conflict body, used to narrow candidate lookups.
pub fn fingerprint(conflict_text: &str) -> String {
    short_sha256(&[conflict_text.as_bytes()])
}

/// Hash over everything that distinguishes one record from another: the
/// region's body, context and line range, and the text that resolved it.
///
/// Equal hashes mean equal records, so rewriting one is a no-op while a
/// different resolution of the same region is kept alongside the first.
pub fn record_hash(region: &ConflictRegion, resolution: &str) -> String {
    let start = region.start_line.to_string();
    let end = region.end_line.to_string();
    short_sha256(&[
        region.conflict_text.as_bytes(),
        region.before_context.as_bytes(),
        region.after_context.as_bytes(),
        start.as_bytes(),
        end.as_bytes(),
        resolution.as_bytes(),
    ])
}

fn short_sha256(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(HASH_LEN);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> ConflictRegion {
        ConflictRegion {
            conflict_text: "<<<<<<<\nA\n=======\nB\n>>>>>>>".into(),
            before_context: "before".into(),
            after_context: "after".into(),
            start_line: 1,
            end_line: 5,
            file_path: "f.txt".into(),
        }
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let conflict = "<<<<<<<\nversion A\n=======\nversion B\n>>>>>>>";
        let a = fingerprint(conflict);
        let b = fingerprint(conflict);
        assert_eq!(a.len(), 16);
        assert_eq!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_matches_sha256_prefix() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb924...
        assert_eq!(fingerprint(""), "e3b0c44298fc1c14");
    }

    #[test]
    fn test_record_hash_is_stable() {
        let a = record_hash(&region(), "x\n");
        assert_eq!(a.len(), 16);
        assert_eq!(a, record_hash(&region(), "x\n"));
    }

    #[test]
    fn test_record_hash_ignores_file_path() {
        let mut other = region();
        other.file_path = "elsewhere.txt".into();
        assert_eq!(record_hash(&region(), "x\n"), record_hash(&other, "x\n"));
    }

    #[test]
    fn test_record_hash_distinguishes_context_range_and_resolution() {
        let base = record_hash(&region(), "x\n");

        let mut moved = region();
        moved.start_line = 10;
        moved.end_line = 14;
        assert_ne!(base, record_hash(&moved, "x\n"));

        let mut recontext = region();
        recontext.before_context = "different".into();
        assert_ne!(base, record_hash(&recontext, "x\n"));

        assert_ne!(base, record_hash(&region(), "y\n"));
        assert_ne!(base, record_hash(&region(), ""));

        // Same fingerprint either way.
        assert_eq!(
            ResolutionRecord::new(region(), "x").key().fingerprint,
            ResolutionRecord::new(moved, "y").key().fingerprint
        );
    }

    #[test]
    fn test_key_round_trips_through_display() {
        let key = ResolutionRecord::new(region(), "resolved\n").key();
        let parsed = RecordKey::parse(&key.to_string()).unwrap();
        assert_eq!(parsed, key);
        assert!(RecordKey::parse("nounderscore").is_none());
        assert!(RecordKey::parse("_abc").is_none());
    }

    #[test]
    fn test_record_json_layout() {
        let record = ResolutionRecord::new(region(), "resolved\n");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["conflict"], "<<<<<<<\nA\n=======\nB\n>>>>>>>");
        assert_eq!(json["resolution"], "resolved\n");
        assert_eq!(json["start_line"], 1);
        assert_eq!(json["file_path"], "f.txt");
    }

    #[test]
    fn test_record_without_timestamp_parses() {
        let json = r#"{
            "file_path": "a.txt",
            "conflict": "<<<<<<<\nA\n=======\nB\n>>>>>>>\n",
            "resolution": "A\n",
            "before_context": "",
            "after_context": "",
            "start_line": 0,
            "end_line": 4
        }"#;
        let record: ResolutionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.resolution, "A\n");
        assert!(record.recorded_at.is_none());
    }
}
