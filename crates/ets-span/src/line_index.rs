//! Offset to line/column conversion.

use crate::ByteOffset;
use text_size::TextSize;

/// A zero-based line/column pair. Columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// One-based line number, as printed in diagnostics and `extraInfo`.
    #[inline]
    pub fn line_number(&self) -> u32 {
        self.line + 1
    }

    /// One-based column number.
    #[inline]
    pub fn column_number(&self) -> u32 {
        self.col + 1
    }
}

/// Line start table for a source unit.
///
/// Lookups binary-search the table, so building the index once per unit and
/// querying it for every diagnostic is cheap.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<ByteOffset>,
    len: ByteOffset,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        line_starts.extend(
            text.match_indices('\n')
                .map(|(offset, _)| TextSize::from(offset as u32 + 1)),
        );
        Self {
            line_starts,
            len: TextSize::from(text.len() as u32),
        }
    }

    /// Converts an offset to a line/column pair.
    ///
    /// Returns `None` for offsets past the end of the text.
    pub fn line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        if offset > self.len {
            return None;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let col = u32::from(offset) - u32::from(self.line_starts[line]);
        Some(LineCol::new(line as u32, col))
    }
}
