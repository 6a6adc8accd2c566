//! The text store interface consumed by the article model

use crate::{Gravity, MarkId, Position, Result};

/// An ordered, mutable character sequence with stable marks.
///
/// All offsets are in characters. Implementations must keep marks ordered:
/// an edit never makes two marks swap places.
pub trait TextStore {
    /// Number of characters in the store
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of the first character
    fn start(&self) -> Position {
        Position::zero()
    }

    /// Position just after the last character
    fn end(&self) -> Position {
        Position::new(self.len())
    }

    /// Clamp an arbitrary offset into the store
    fn position_at_offset(&self, offset: usize) -> Position {
        Position::new(offset.min(self.len()))
    }

    /// Insert `text` at `at`, shifting marks after it
    fn insert(&mut self, at: Position, text: &str) -> Result<()>;

    /// Delete the characters in `[start, end)`; marks inside collapse to `start`
    fn delete(&mut self, start: Position, end: Position) -> Result<()>;

    /// Read the characters in `[start, end)`
    fn slice(&self, start: Position, end: Position) -> Result<String>;

    /// Register a mark at `at`
    fn create_mark(&mut self, at: Position, gravity: Gravity) -> Result<MarkId>;

    /// Current position of a mark
    fn mark_position(&self, mark: MarkId) -> Result<Position>;

    /// Reposition a mark explicitly
    fn move_mark(&mut self, mark: MarkId, to: Position) -> Result<()>;

    /// Unregister a mark
    fn delete_mark(&mut self, mark: MarkId) -> Result<()>;

    /// Number of live marks
    fn mark_count(&self) -> usize;

    /// The whole text
    fn text(&self) -> String {
        self.slice(self.start(), self.end()).unwrap_or_default()
    }
}
