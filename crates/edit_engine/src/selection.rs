//! Selection export and drag bookkeeping

use crate::{Article, EditError, Result};
use doc_model::{exact_index, RunElement, Span};
use text_store::{Gravity, MarkId, Position, Range, TextStore};

/// A selection remembered when a drag starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DragSelection {
    len: usize,
    start: MarkId,
    end: MarkId,
}

impl<S: TextStore> Article<S> {
    /// The content between two positions as a run, ready to be inserted
    /// elsewhere.
    ///
    /// Sections covered from their start come out whole; a partially covered
    /// first section is closed by a paragraph sentinel.
    pub fn range_between(&self, from: Position, to: Position) -> Result<Vec<RunElement>> {
        let range = Range::new(from, to);
        self.check_position(range.end)?;
        if range.is_empty() || self.sections.is_empty() {
            return Ok(Vec::new());
        }

        let starts = self.section_starts()?;
        let first = exact_index(&starts, range.start).unwrap_or(0);
        let last = exact_index(&starts, range.end.backward(1)).unwrap_or(0);
        let end = self.section_end(first)?;
        if first == last {
            return Ok(self.sections[first].data_range(&self.store, range.start, range.end, end)?);
        }

        let mut run = Vec::new();
        let section = &self.sections[first];
        if range.start <= section.start(&self.store)? {
            run.push(RunElement::Section(section.to_data(&self.store, end)?));
        } else {
            run.extend(section.data_range(&self.store, range.start, end, end)?);
            run.push(RunElement::paragraph_sentinel());
        }

        for index in first + 1..last {
            let end = self.section_end(index)?;
            run.push(RunElement::Section(self.sections[index].to_data(&self.store, end)?));
        }

        let section = &self.sections[last];
        let end = self.section_end(last)?;
        if range.end >= end {
            run.push(RunElement::Section(section.to_data(&self.store, end)?));
        } else {
            let start = section.start(&self.store)?;
            run.extend(section.data_range(&self.store, start, range.end, end)?);
        }
        Ok(run)
    }

    /// Remember `range` as the selection being dragged, replacing any
    /// previous one
    pub fn remember_selection(&mut self, range: Range) -> Result<()> {
        self.check_position(range.end)?;
        self.forget_selection()?;
        let start = self.store.create_mark(range.start, Gravity::Left)?;
        let end = match self.store.create_mark(range.end, Gravity::Left) {
            Ok(mark) => mark,
            Err(err) => {
                self.store.delete_mark(start)?;
                return Err(err.into());
            }
        };
        self.drag = Some(DragSelection {
            len: range.len(),
            start,
            end,
        });
        Ok(())
    }

    /// Drop the remembered selection, if any
    pub fn forget_selection(&mut self) -> Result<()> {
        if let Some(drag) = self.drag.take() {
            self.store.delete_mark(drag.start)?;
            self.store.delete_mark(drag.end)?;
        }
        Ok(())
    }

    pub fn has_drag_selection(&self) -> bool {
        self.drag.is_some()
    }

    /// Delete the remembered selection after its content was inserted
    /// elsewhere, and return the range that was deleted.
    ///
    /// Content dropped in front of the selection moves both marks, content
    /// dropped exactly at its start moves only the end mark; either way the
    /// selection is the `len` characters before the end mark unless the
    /// marks still span exactly `len`.
    pub fn delete_drag_selection(&mut self) -> Result<Range> {
        let drag = self.drag.take().ok_or(EditError::NoDragSelection)?;
        let start = self.store.mark_position(drag.start);
        let end = self.store.mark_position(drag.end);
        self.store.delete_mark(drag.start)?;
        self.store.delete_mark(drag.end)?;
        let (start, end) = (start?, end?);

        let range = if end.offset().saturating_sub(start.offset()) == drag.len {
            Range::new(start, end)
        } else {
            Range::new(end.backward(drag.len), end)
        };
        self.delete_selection(range.start, range.end)?;
        tracing::debug!("deleted dragged selection {}..{}", range.start, range.end);
        Ok(range)
    }
}
