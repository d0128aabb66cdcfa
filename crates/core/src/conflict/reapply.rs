//! Replaying stored resolutions into a conflicted file.
//!
//! Regions are processed bottom-up: replacing a region changes the line
//! count below it, never above it, so the line numbers of regions still
//! waiting to be processed stay valid.

use tracing::{debug, info, warn};

use super::{split_lines, ConflictRegion, ContextSimilarityMatcher};
use crate::errors::StoreError;
use crate::store::{RecordKey, RecordStore};

/// A region that was replaced by a stored resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedResolution {
    /// Line range of the region in the file before replacement.
    pub start_line: usize,
    pub end_line: usize,
    pub confidence: f64,
    pub record_key: RecordKey,
    /// Where the resolution was originally recorded.
    pub source_file: String,
    pub source_line: usize,
}

/// Outcome of replaying resolutions into one file's content.
#[derive(Debug, Clone, PartialEq)]
pub struct ReapplyResult {
    pub original: String,
    pub updated: String,
    /// Replaced regions, top to bottom.
    pub applied: Vec<AppliedResolution>,
    /// Regions left untouched because no record cleared the threshold, top
    /// to bottom.
    pub unmatched: Vec<ConflictRegion>,
}

impl ReapplyResult {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Looks up and splices stored resolutions for a file's conflict regions.
pub struct Reapplier<'a> {
    store: &'a RecordStore,
    matcher: ContextSimilarityMatcher,
}

impl<'a> Reapplier<'a> {
    pub fn new(store: &'a RecordStore, matcher: ContextSimilarityMatcher) -> Self {
        Self { store, matcher }
    }

    /// Replace every region of `content` that has a stored resolution whose
    /// context similarity reaches the threshold.
    ///
    /// `regions` must have been extracted from `content`. When nothing
    /// matches, `updated` is identical to `content`.
    pub fn reapply(&self, content: &str, regions: &[ConflictRegion]) -> Result<ReapplyResult, StoreError> {
        let mut lines: Vec<String> = split_lines(content).into_iter().map(str::to_string).collect();
        let mut ordered: Vec<&ConflictRegion> = regions.iter().collect();
        ordered.sort_by(|a, b| b.start_line.cmp(&a.start_line));

        let mut applied = Vec::new();
        let mut unmatched = Vec::new();

        for region in ordered {
            if region.end_line >= lines.len() {
                warn!(
                    file_path = %region.file_path,
                    start_line = region.start_line,
                    "region lies outside the file, skipping"
                );
                unmatched.push(region.clone());
                continue;
            }

            let candidates = self.store.find_by_fingerprint(&region.conflict_text)?;
            let Some(found) = self.matcher.find_best(region, &candidates) else {
                debug!(
                    file_path = %region.file_path,
                    start_line = region.start_line,
                    candidates = candidates.len(),
                    "no stored resolution matched"
                );
                unmatched.push(region.clone());
                continue;
            };

            splice_region(&mut lines, region, found.resolution);
            info!(
                file_path = %region.file_path,
                start_line = region.start_line,
                confidence = found.confidence,
                source_file = found.source_file,
                source_line = found.source_line,
                "applied stored resolution"
            );
            applied.push(AppliedResolution {
                start_line: region.start_line,
                end_line: region.end_line,
                confidence: found.confidence,
                record_key: found.key.clone(),
                source_file: found.source_file.to_string(),
                source_line: found.source_line,
            });
        }

        applied.reverse();
        unmatched.reverse();

        let updated = if applied.is_empty() {
            content.to_string()
        } else {
            lines.concat()
        };

        Ok(ReapplyResult {
            original: content.to_string(),
            updated,
            applied,
            unmatched,
        })
    }
}

/// Replace lines `[start_line, end_line]` with the lines of `resolution`.
///
/// A resolution recorded at the end of a file may lack a final newline; it
/// gets one when spliced in front of further lines.
fn splice_region(lines: &mut Vec<String>, region: &ConflictRegion, resolution: &str) {
    let mut replacement: Vec<String> = split_lines(resolution).into_iter().map(str::to_string).collect();
    if region.end_line + 1 < lines.len() {
        if let Some(last) = replacement.last_mut() {
            if !last.ends_with('\n') {
                last.push('\n');
            }
        }
    }
    lines.splice(region.start_line..=region.end_line, replacement);
}
