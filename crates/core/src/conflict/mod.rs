//! Conflict extraction, matching, reconstruction and replay.
//!
//! The conflict subsystem is responsible for:
//! 1. **Extraction** -- finding marker-delimited regions and their context.
//! 2. **Reconstruction** -- recovering the text a human put in place of each
//!    region, by comparing a snapshot with the resolved file.
//! 3. **Matching** -- scoring stored resolutions against a new region.
//! 4. **Reapplying** -- splicing matched resolutions into a file.

pub mod extractor;
pub mod matcher;
pub mod reapply;
pub mod reconstruct;

use serde::{Deserialize, Serialize};

pub use extractor::ConflictExtractor;
pub use matcher::{ContextSimilarityMatcher, Match};
pub use reapply::{AppliedResolution, ReapplyResult, Reapplier};
pub use reconstruct::{Reconstruction, ResolutionReconstructor};

/// Prefix of the line opening a conflict region.
pub const OPENING_MARKER: &str = "<<<<<<<";
/// Prefix of the line separating the two sides of a region.
pub const SEPARATOR_MARKER: &str = "=======";
/// Prefix of the line closing a conflict region.
pub const CLOSING_MARKER: &str = ">>>>>>>";

/// A single conflict region extracted from a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRegion {
    /// Literal text from the opening marker line through the closing marker
    /// line, newlines included.
    #[serde(rename = "conflict")]
    pub conflict_text: String,
    /// Up to `context_lines` unmodified lines preceding the region.
    #[serde(default)]
    pub before_context: String,
    /// Up to `context_lines` unmodified lines following the region.
    #[serde(default)]
    pub after_context: String,
    /// Zero-based line index of the opening marker.
    pub start_line: usize,
    /// Zero-based line index of the closing marker.
    pub end_line: usize,
    /// The file the region was extracted from.
    pub file_path: String,
}

impl ConflictRegion {
    /// Number of lines spanned by the region, markers included.
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// Split `content` into lines, each keeping its trailing `\n`.
///
/// Joining the result reproduces `content` exactly.
pub fn split_lines(content: &str) -> Vec<&str> {
    content.split_inclusive('\n').collect()
}

pub(crate) fn is_opening_marker(line: &str) -> bool {
    line.starts_with(OPENING_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_preserves_content() {
        let content = "a\nb\r\n\nlast";
        let lines = split_lines(content);
        assert_eq!(lines, vec!["a\n", "b\r\n", "\n", "last"]);
        assert_eq!(lines.concat(), content);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_line_count() {
        let region = ConflictRegion {
            conflict_text: String::new(),
            before_context: String::new(),
            after_context: String::new(),
            start_line: 3,
            end_line: 7,
            file_path: "f".into(),
        };
        assert_eq!(region.line_count(), 5);
    }
}
