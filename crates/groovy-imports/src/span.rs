//! Byte spans over the original source buffer.
//!
//! Every token, import declaration and identifier reference carries a
//! `SourceSpan` so the rewriter can cut the original text without ever
//! re-rendering it.

use std::fmt;
use std::ops::Range;

/// A byte range in the source plus the 1-based line/column of its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl SourceSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Offsets of line starts, used to turn byte offsets into line/column pairs
/// and to cut whole lines out of the buffer.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Number of lines; a trailing terminator opens a final empty line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Zero-based line containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    /// Byte range of a zero-based line, including its terminator.
    pub fn line_range(&self, line: usize) -> Range<usize> {
        let start = self.line_starts[line];
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.len);
        start..end
    }

    pub fn span(&self, source: &str, start: usize, end: usize) -> SourceSpan {
        let line = self.line_of(start);
        let line_start = self.line_starts[line];
        SourceSpan {
            start,
            end,
            line: line + 1,
            column: source[line_start..start].chars().count() + 1,
        }
    }
}
