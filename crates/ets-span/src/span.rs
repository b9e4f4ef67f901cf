//! Byte spans over a source unit.

use text_size::TextSize;

/// A byte offset into a source unit.
pub type ByteOffset = TextSize;

/// A half-open byte range `[start, end)` in a source unit.
///
/// Nodes synthesized by the front end (rather than parsed from text) use
/// [`Span::default`], which is the empty span at offset zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// First byte covered.
    pub start: ByteOffset,
    /// First byte past the end.
    pub end: ByteOffset,
}

impl Span {
    #[inline]
    pub fn new(start: impl Into<ByteOffset>, end: impl Into<ByteOffset>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// True for spans of synthesized nodes and zero-width markers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span enclosing both, e.g. an unclosed node together with the point
    /// where its parent ended.
    #[inline]
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
