//! Resolution reconstruction.
//!
//! Given the pre-resolution snapshot of a file and the file after a human
//! resolved it, recover the literal text that replaced each conflict region.
//!
//! The resolved text for a region starts where the region started, shifted
//! by however much earlier resolutions grew or shrank the file. It ends at
//! the first line from which the resolved file runs in step with the lines
//! following the region in the snapshot for `resync_lines` consecutive
//! lines, or until the snapshot reaches the next conflict. Unless
//! `count_blank_lines` is set, blank lines are skipped on both sides while
//! looking for that run, so a blank line added or dropped between the
//! resolution and the following code does not prevent resynchronization.
//! Blank lines right after a resolution are then counted as following code.
//!
//! This is a heuristic, not a diff. Resolutions that end with a copy of the
//! lines that follow the conflict are captured short.

use tracing::debug;

use super::{is_opening_marker, split_lines, ConflictRegion};
use crate::config::ReconstructConfig;

/// Resolutions for every region of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    /// One resolution per input region, in the same order.
    pub resolutions: Vec<String>,
    /// Net change in line count between the snapshot and the resolved file
    /// accounted for by the regions.
    pub line_delta: isize,
}

/// Recovers resolution text by resynchronizing snapshot and resolved file.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionReconstructor {
    resync_lines: usize,
    count_blank_lines: bool,
}

impl Default for ResolutionReconstructor {
    fn default() -> Self {
        Self::from_config(&ReconstructConfig::default())
    }
}

impl ResolutionReconstructor {
    pub fn new(resync_lines: usize) -> Self {
        Self {
            resync_lines: resync_lines.max(1),
            count_blank_lines: false,
        }
    }

    pub fn from_config(config: &ReconstructConfig) -> Self {
        Self::new(config.resync_lines).count_blank_lines(config.count_blank_lines)
    }

    /// Whether blank lines count towards resynchronization.
    pub fn count_blank_lines(mut self, count: bool) -> Self {
        self.count_blank_lines = count;
        self
    }

    /// Recover the resolution of a single region.
    ///
    /// `offset` is the shift, in lines, of the resolved file relative to the
    /// snapshot at the region's position. Returns the resolution text and
    /// the number of resolved-file lines it spans.
    pub fn reconstruct(
        &self,
        pre: &[&str],
        post: &[&str],
        region: &ConflictRegion,
        offset: isize,
    ) -> (String, usize) {
        let start = (region.start_line as isize + offset).clamp(0, post.len() as isize) as usize;
        let resume = region.end_line + 1;

        let end = (start..post.len())
            .find(|&candidate| self.resyncs_at(pre, post, resume, candidate))
            .unwrap_or(post.len());

        (post[start..end].concat(), end - start)
    }

    /// Whether `post` from `post_idx` runs in step with `pre` from `pre_idx`.
    ///
    /// True once `resync_lines` lines match, or when `pre` reaches an opening
    /// marker or `post` runs out before a mismatch. When `pre` runs out, the
    /// rest of `post` must be used up too.
    fn resyncs_at(
        &self,
        pre: &[&str],
        post: &[&str],
        mut pre_idx: usize,
        mut post_idx: usize,
    ) -> bool {
        let mut matches = 0;
        loop {
            if !self.count_blank_lines {
                pre_idx = skip_blank_lines(pre, pre_idx);
                post_idx = skip_blank_lines(post, post_idx);
            }
            if pre_idx >= pre.len() {
                return post_idx >= post.len();
            }
            if is_opening_marker(pre[pre_idx]) || post_idx >= post.len() {
                return true;
            }
            if !same_line(post[post_idx], pre[pre_idx]) {
                return false;
            }
            matches += 1;
            if matches == self.resync_lines {
                return true;
            }
            pre_idx += 1;
            post_idx += 1;
        }
    }

    /// Recover the resolutions of all `regions` of one file.
    ///
    /// `regions` must be the regions extracted from `pre_content`, top to
    /// bottom.
    pub fn reconstruct_all(
        &self,
        pre_content: &str,
        post_content: &str,
        regions: &[ConflictRegion],
    ) -> Reconstruction {
        let pre = split_lines(pre_content);
        let post = split_lines(post_content);

        let mut offset: isize = 0;
        let mut resolutions = Vec::with_capacity(regions.len());
        for region in regions {
            let (text, consumed) = self.reconstruct(&pre, &post, region, offset);
            offset += consumed as isize - region.line_count() as isize;
            debug!(
                file_path = %region.file_path,
                start_line = region.start_line,
                resolution_lines = consumed,
                offset,
                "reconstructed resolution"
            );
            resolutions.push(text);
        }

        Reconstruction {
            resolutions,
            line_delta: offset,
        }
    }
}

fn skip_blank_lines(lines: &[&str], mut idx: usize) -> usize {
    while idx < lines.len() && lines[idx].trim().is_empty() {
        idx += 1;
    }
    idx
}

/// Compare two lines ignoring their line terminators.
fn same_line(a: &str, b: &str) -> bool {
    strip_line_ending(a) == strip_line_ending(b)
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
