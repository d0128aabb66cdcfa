//! Conflict region extraction.
//!
//! A single forward pass over a file's lines finds every completed
//! `<<<<<<<` / `=======` / `>>>>>>>` region and captures a bounded amount of
//! unmodified context on either side of it.

use std::collections::VecDeque;

use tracing::debug;

use super::{is_opening_marker, split_lines, ConflictRegion, CLOSING_MARKER};

/// A region whose opening marker has been seen but not yet its closing one.
struct OpenRegion {
    start_line: usize,
    before_context: String,
    body: String,
}

/// Stateless extractor configured with the number of context lines to keep.
#[derive(Debug, Clone, Copy)]
pub struct ConflictExtractor {
    context_lines: usize,
}

impl ConflictExtractor {
    pub fn new(context_lines: usize) -> Self {
        Self { context_lines }
    }

    pub fn context_lines(&self) -> usize {
        self.context_lines
    }

    /// Extract every completed conflict region from `content`.
    ///
    /// Regions are returned top to bottom. An opening marker that is never
    /// closed yields nothing; a second opening marker seen before the first
    /// one closes abandons the first and starts over.
    pub fn extract(&self, content: &str, file_path: &str) -> Vec<ConflictRegion> {
        let lines = split_lines(content);
        let mut regions = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut current: Option<OpenRegion> = None;

        for (i, line) in lines.iter().enumerate() {
            if is_opening_marker(line) {
                let before_context = match current.take() {
                    Some(abandoned) => {
                        debug!(
                            file_path,
                            start_line = abandoned.start_line,
                            "dropping unterminated conflict region"
                        );
                        abandoned.before_context
                    }
                    None => window.iter().copied().collect(),
                };
                current = Some(OpenRegion {
                    start_line: i,
                    before_context,
                    body: line.to_string(),
                });
                continue;
            }

            match current.take() {
                Some(mut open) => {
                    open.body.push_str(line);
                    if line.starts_with(CLOSING_MARKER) {
                        let after_context: String = lines[i + 1..]
                            .iter()
                            .take(self.context_lines)
                            .take_while(|l| !is_opening_marker(l))
                            .copied()
                            .collect();
                        regions.push(ConflictRegion {
                            conflict_text: open.body,
                            before_context: open.before_context,
                            after_context,
                            start_line: open.start_line,
                            end_line: i,
                            file_path: file_path.to_string(),
                        });
                        window.clear();
                    } else {
                        current = Some(open);
                    }
                }
                None => {
                    if self.context_lines > 0 {
                        window.push_back(line);
                        if window.len() > self.context_lines {
                            window.pop_front();
                        }
                    }
                }
            }
        }

        if let Some(open) = current {
            debug!(
                file_path,
                start_line = open.start_line,
                "ignoring conflict region without closing marker"
            );
        }

        debug!(file_path, count = regions.len(), "extracted conflict regions");
        regions
    }
}
