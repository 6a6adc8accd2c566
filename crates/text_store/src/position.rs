//! Positions, ranges and marks

use serde::{Deserialize, Serialize};

/// A character offset into a text store.
///
/// A `Position` is only meaningful until the store is edited again; use a
/// mark to follow a location across edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position(usize);

impl Position {
    /// Create a position at a character offset
    pub const fn new(offset: usize) -> Self {
        Self(offset)
    }

    /// The start of any text
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the character offset
    pub fn offset(self) -> usize {
        self.0
    }

    /// Move forward by `count` characters
    pub fn forward(self, count: usize) -> Self {
        Self(self.0 + count)
    }

    /// Move backward by `count` characters, stopping at the start
    pub fn backward(self, count: usize) -> Self {
        Self(self.0.saturating_sub(count))
    }

    /// Number of characters between two positions, in either order
    pub fn distance(self, other: Position) -> usize {
        self.0.abs_diff(other.0)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for Position {
    fn from(offset: usize) -> Self {
        Self(offset)
    }
}

/// A half-open `[start, end)` span with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a range from two positions in any order
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// A zero-length range at `position`
    pub fn collapsed(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Number of characters covered
    pub fn len(&self) -> usize {
        self.end.offset() - self.start.offset()
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `position` lies inside the range (end excluded)
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position < self.end
    }

    /// Whether two ranges share at least one character
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Which way a mark moves when text is inserted exactly at it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gravity {
    /// Stay before the inserted text
    Left,
    /// Move after the inserted text
    Right,
}

/// Handle to a mark registered with a text store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkId(u64);

impl MarkId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MarkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mark#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_normalizes_order() {
        let range = Range::new(Position::new(9), Position::new(3));
        assert_eq!(range.start, Position::new(3));
        assert_eq!(range.end, Position::new(9));
        assert_eq!(range.len(), 6);
    }

    #[test]
    fn test_range_contains_excludes_end() {
        let range = Range::new(Position::new(2), Position::new(5));
        assert!(range.contains(Position::new(2)));
        assert!(range.contains(Position::new(4)));
        assert!(!range.contains(Position::new(5)));
        assert!(!Range::collapsed(Position::new(2)).contains(Position::new(2)));
    }

    #[test]
    fn test_range_overlaps() {
        let a = Range::new(Position::new(0), Position::new(4));
        let b = Range::new(Position::new(4), Position::new(8));
        let c = Range::new(Position::new(3), Position::new(5));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_position_arithmetic() {
        let pos = Position::new(4);
        assert_eq!(pos.forward(3), Position::new(7));
        assert_eq!(pos.backward(10), Position::zero());
        assert_eq!(pos.distance(Position::new(1)), 3);
    }
}
