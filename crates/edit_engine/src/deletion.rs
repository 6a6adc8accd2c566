//! Structured deletion and splitting
//!
//! Deletion is sentence-granular: covered sentences disappear, partially
//! covered ones lose the covered text, and containers left without content
//! go with them. Section boundaries outside the deleted range survive.

use crate::{Article, EditError, Result, SectionSlot};
use doc_model::{best_gap, exact_index, shift_marks, Section, Span};
use text_store::{Gravity, MarkId, Position, Range, TextStore};

impl<S: TextStore> Article<S> {
    /// Delete the content between two positions, in either order.
    ///
    /// Separators are structure, not content: they go only with the
    /// sentences they close, so a range covering nothing but paragraph
    /// breaks and blank lines leaves the text unchanged.
    pub fn delete_selection(&mut self, from: Position, to: Position) -> Result<()> {
        let range = Range::new(from, to);
        if range.is_empty() {
            return Ok(());
        }
        self.check_position(range.end)?;
        if self.sections.is_empty() {
            self.store.delete(range.start, range.end)?;
            return Ok(());
        }

        let starts = self.section_starts()?;
        let first = exact_index(&starts, range.start).unwrap_or(0);
        let last = exact_index(&starts, range.end.backward(1)).unwrap_or(0);
        if first == last {
            let end = self.section_end(first)?;
            if self.sections[first].delete_range(&mut self.store, range, end)? {
                self.remove_section_at(first)?;
            }
            return Ok(());
        }

        let start_mark = self.store.create_mark(range.start, Gravity::Left)?;
        let end_mark = match self.store.create_mark(range.end, Gravity::Left) {
            Ok(mark) => mark,
            Err(err) => {
                self.store.delete_mark(start_mark)?;
                return Err(err.into());
            }
        };
        let result = self.delete_across(first, last, start_mark, end_mark);
        self.store.delete_mark(start_mark)?;
        self.store.delete_mark(end_mark)?;
        tracing::debug!("deleted across sections {}..={}", first, last);
        result
    }

    /// Delete from inside section `first` to inside section `last`
    fn delete_across(&mut self, first: usize, last: usize, start_mark: MarkId, end_mark: MarkId) -> Result<()> {
        let head = Range::new(
            self.sections[last].start(&self.store)?,
            self.store.mark_position(end_mark)?,
        );
        let end = self.section_end(last)?;
        if self.sections[last].delete_range(&mut self.store, head, end)? {
            self.remove_section_at(last)?;
        }

        for index in (first + 1..last).rev() {
            self.remove_section_at(index)?;
        }

        let end = self.section_end(first)?;
        let tail = Range::new(self.store.mark_position(start_mark)?, end);
        if self.sections[first].delete_range(&mut self.store, tail, end)? {
            self.remove_section_at(first)?;
        }
        Ok(())
    }

    /// Remove the section containing `position`, text and all
    pub fn remove_section(&mut self, position: Position) -> Result<()> {
        match self.section_at(position)? {
            SectionSlot::Body(index) => {
                self.remove_section_at(index)?;
                Ok(())
            }
            slot => Err(EditError::InvalidTarget(format!(
                "no section to remove at {} ({:?})",
                position, slot
            ))),
        }
    }

    /// Delete section `index`'s text and release its marks
    pub(crate) fn remove_section_at(&mut self, index: usize) -> Result<Range> {
        let range = self.section_range(index)?;
        let section = self.sections.remove(index);
        self.store.delete(range.start, range.end)?;
        section.release(&mut self.store)?;
        Ok(range)
    }

    /// Insert one section at the section boundary closest to `position`.
    ///
    /// Returns the range the section occupies; collapsed when the snapshot
    /// had no content.
    pub fn insert_section(&mut self, data: &doc_model::SectionData, position: Position) -> Result<Range> {
        self.check_position(position)?;
        let starts = self.section_starts()?;
        let end = self.store.end();
        let index = best_gap(&starts, end, position);
        let at = starts.get(index).copied().unwrap_or(end);

        let followers = self.followers(at)?;
        let before = self.store.len();
        let Some(section) = Section::insert(&mut self.store, data, at, &self.config)? else {
            return Ok(Range::collapsed(at));
        };
        let added = self.store.len() - before;
        shift_marks(&mut self.store, &followers, added)?;
        self.sections.insert(index, section);
        Ok(Range::new(at, at.forward(added)))
    }

    /// Split the section containing `position` in two at the paragraph
    /// boundary nearest it, first splitting the paragraph there.
    ///
    /// Returns whether a split happened; a split that would leave either
    /// side without content leaves the section unchanged.
    pub fn split_section(&mut self, position: Position) -> Result<bool> {
        let SectionSlot::Body(index) = self.section_at(position)? else {
            return Err(EditError::InvalidTarget(format!("no section to split at {}", position)));
        };
        let number = self.sections[index].exact_paragraph(&self.store, position)?;
        let paragraph_end = self.paragraph_end(index, number)?;
        let sentence = self
            .paragraph(index, number)?
            .best_sentence_gap(&self.store, paragraph_end, position)?;
        let section_end = self.section_end(index)?;

        let Article {
            sections,
            store,
            config,
            ..
        } = self;
        let section = &mut sections[index];
        let gap = if section.split_paragraph(store, number, sentence, config)? {
            number + 1
        } else {
            section.best_paragraph_gap(store, section_end, position)?
        };
        match section.split_off(store, gap, config)? {
            Some(second) => {
                sections.insert(index + 1, second);
                tracing::debug!("split section {} before paragraph {}", index, gap);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{ArticleData, ParagraphData, SectionData, SentenceData};

    fn section_data(paragraphs: &[&[&str]]) -> SectionData {
        SectionData::new(
            paragraphs
                .iter()
                .map(|sentences| ParagraphData::new(sentences.iter().map(|t| SentenceData::text(*t)).collect()))
                .collect(),
        )
    }

    fn article(sections: &[&[&[&str]]]) -> Article {
        let sections = sections.iter().map(|paragraphs| section_data(paragraphs)).collect();
        Article::new(&ArticleData::new("Test", sections)).unwrap()
    }

    #[test]
    fn test_delete_inside_one_section() {
        let mut article = article(&[&[&["One. ", "Two."], &["Three."]]]);
        // "One. Two.\nThree.\n\n": delete "Two.\nThree."
        article.delete_selection(Position::new(5), Position::new(16)).unwrap();
        assert_eq!(article.text(), "One. \n\n");
        assert_eq!(article.sections()[0].content_len(), 1);
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_delete_whole_section_removes_it() {
        let mut article = article(&[&[&["A."]], &[&["B."]]]);
        article.delete_selection(Position::new(0), Position::new(2)).unwrap();
        assert_eq!(article.text(), "B.\n\n");
        assert_eq!(article.section_count(), 1);
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_delete_across_sections_keeps_boundary() {
        let mut article = article(&[&[&["A. ", "B."]], &[&["C."]], &[&["D. ", "E."]]]);
        // "A. B.\n\nC.\n\nD. E.\n\n": from "B." to just before "E."
        article.delete_selection(Position::new(3), Position::new(14)).unwrap();
        assert_eq!(article.text(), "A. \n\nE.\n\n");
        assert_eq!(article.section_count(), 2);
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_empty_and_out_of_range_deletions() {
        let mut article = article(&[&[&["A."]]]);
        article.delete_selection(Position::new(1), Position::new(1)).unwrap();
        assert_eq!(article.text(), "A.\n\n");
        assert!(matches!(
            article.delete_selection(Position::new(0), Position::new(40)),
            Err(EditError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_delete_of_separators_only_changes_nothing() {
        let mut article = article(&[&[&["A."]], &[&["B."]]]);
        // "A.\n\nB.\n\n": the break and blank line closing the first section
        article.delete_selection(Position::new(2), Position::new(4)).unwrap();
        assert_eq!(article.text(), "A.\n\nB.\n\n");
        assert_eq!(article.section_count(), 2);
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_remove_section() {
        let mut article = article(&[&[&["A."]], &[&["B."]], &[&["C."]]]);
        article.remove_section(Position::new(5)).unwrap();
        assert_eq!(article.text(), "A.\n\nC.\n\n");
        assert!(article.remove_section(article.store().end()).is_err());
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_insert_section_at_nearest_gap() {
        let mut article = article(&[&[&["A."]], &[&["B."]]]);
        // Position 5 is nearer the start of "B." than its end
        let range = article
            .insert_section(&section_data(&[&["New."]]), Position::new(5))
            .unwrap();
        assert_eq!(range, Range::new(Position::new(4), Position::new(10)));
        assert_eq!(article.text(), "A.\n\nNew.\n\nB.\n\n");
        assert_eq!(article.section_count(), 3);
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_split_section_inside_paragraph() {
        let mut article = article(&[&[&["A. ", "B."], &["C."]]]);
        // "A. B.\nC.\n\n": split between the two sentences
        assert!(article.split_section(Position::new(3)).unwrap());
        assert_eq!(article.text(), "A. \n\nB.\nC.\n\n");
        assert_eq!(article.section_count(), 2);
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_split_section_at_paragraph_boundary() {
        let mut article = article(&[&[&["A."], &["B."]]]);
        article.sections[0].source_section_id = Some(3);
        assert!(article.split_section(Position::new(3)).unwrap());
        assert_eq!(article.text(), "A.\n\nB.\n\n");
        assert_eq!(article.sections()[1].source_section_id, Some(3));
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_split_section_at_edge_is_abandoned() {
        let mut article = article(&[&[&["A."], &["B."]]]);
        assert!(!article.split_section(Position::new(0)).unwrap());
        assert_eq!(article.text(), "A.\nB.\n\n");
        assert_eq!(article.section_count(), 1);
    }
}
