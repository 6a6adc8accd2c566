//! In-memory text store

use std::collections::BTreeMap;

use crate::{Gravity, MarkId, Position, Result, StoreError, TextStore};

#[derive(Debug, Clone, Copy)]
struct MarkState {
    offset: usize,
    gravity: Gravity,
}

/// A `String`-backed [`TextStore`] with gravity-aware marks
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: String,
    char_len: usize,
    marks: BTreeMap<MarkId, MarkState>,
    next_mark: u64,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer preloaded with text and no marks
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        Self {
            text,
            char_len,
            marks: BTreeMap::new(),
            next_mark: 0,
        }
    }

    /// Borrow the raw text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn check(&self, position: Position) -> Result<()> {
        if position.offset() > self.char_len {
            return Err(StoreError::PositionOutOfBounds {
                position: position.offset(),
                len: self.char_len,
            });
        }
        Ok(())
    }

    fn check_range(&self, start: Position, end: Position) -> Result<()> {
        if start > end {
            return Err(StoreError::InvalidRange {
                start: start.offset(),
                end: end.offset(),
            });
        }
        self.check(end)
    }

    /// Byte index of a char offset; offset must be in bounds
    fn byte_index(&self, offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(offset)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }

    fn mark_state(&self, mark: MarkId) -> Result<&MarkState> {
        self.marks.get(&mark).ok_or(StoreError::UnknownMark(mark))
    }
}

impl TextStore for TextBuffer {
    fn len(&self) -> usize {
        self.char_len
    }

    fn insert(&mut self, at: Position, text: &str) -> Result<()> {
        self.check(at)?;
        let count = text.chars().count();
        if count == 0 {
            return Ok(());
        }
        let idx = self.byte_index(at.offset());
        self.text.insert_str(idx, text);
        self.char_len += count;

        let at = at.offset();
        for state in self.marks.values_mut() {
            let shifts = state.offset > at || (state.offset == at && state.gravity == Gravity::Right);
            if shifts {
                state.offset += count;
            }
        }
        Ok(())
    }

    fn delete(&mut self, start: Position, end: Position) -> Result<()> {
        self.check_range(start, end)?;
        let count = end.offset() - start.offset();
        if count == 0 {
            return Ok(());
        }
        let from = self.byte_index(start.offset());
        let to = self.byte_index(end.offset());
        self.text.replace_range(from..to, "");
        self.char_len -= count;

        let (start, end) = (start.offset(), end.offset());
        for state in self.marks.values_mut() {
            if state.offset >= end {
                state.offset -= count;
            } else if state.offset > start {
                state.offset = start;
            }
        }
        Ok(())
    }

    fn slice(&self, start: Position, end: Position) -> Result<String> {
        self.check_range(start, end)?;
        Ok(self
            .text
            .chars()
            .skip(start.offset())
            .take(end.offset() - start.offset())
            .collect())
    }

    fn create_mark(&mut self, at: Position, gravity: Gravity) -> Result<MarkId> {
        self.check(at)?;
        let id = MarkId::new(self.next_mark);
        self.next_mark += 1;
        self.marks.insert(
            id,
            MarkState {
                offset: at.offset(),
                gravity,
            },
        );
        Ok(id)
    }

    fn mark_position(&self, mark: MarkId) -> Result<Position> {
        self.mark_state(mark).map(|state| Position::new(state.offset))
    }

    fn move_mark(&mut self, mark: MarkId, to: Position) -> Result<()> {
        self.check(to)?;
        let state = self
            .marks
            .get_mut(&mark)
            .ok_or(StoreError::UnknownMark(mark))?;
        state.offset = to.offset();
        Ok(())
    }

    fn delete_mark(&mut self, mark: MarkId) -> Result<()> {
        self.marks
            .remove(&mark)
            .map(|_| ())
            .ok_or(StoreError::UnknownMark(mark))
    }

    fn mark_count(&self) -> usize {
        self.marks.len()
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}
