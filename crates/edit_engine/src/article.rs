//! Article - the root of the hierarchy and its queries

use crate::selection::DragSelection;
use crate::{EditError, Result};
use doc_model::{
    best_gap, ends, exact_index, starts, ArticleData, DummySection, ImageRef, IntegrityIssue,
    IntegrityReport, Paragraph, ParagraphSpan, Section, Sentence, Span, StructureConfig,
};
use serde::Serialize;
use text_store::{MarkId, Position, Range, TextBuffer, TextStore};

/// Where a position falls among an article's sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionSlot {
    /// Before the first section
    Leading,
    /// Inside the section at this index
    Body(usize),
    /// At the document end, or anywhere in an article without sections
    Trailing,
}

/// Ranges of one section and of everything inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionLayout {
    pub range: Range,
    pub paragraphs: Vec<ParagraphSpan>,
}

/// An article bound to a text store.
///
/// The hierarchy holds no text of its own, only sentence marks into the
/// store, framed by two dummy sections pinned to the document's ends.
#[derive(Debug)]
pub struct Article<S: TextStore = TextBuffer> {
    pub id: u32,
    pub source_article_id: Option<u32>,
    pub title: String,
    pub theme: String,
    pub image_list: Vec<ImageRef>,
    pub(crate) sections: Vec<Section>,
    pub(crate) leading: DummySection,
    pub(crate) trailing: DummySection,
    pub(crate) drag: Option<DragSelection>,
    pub(crate) config: StructureConfig,
    pub(crate) store: S,
}

impl Article<TextBuffer> {
    /// Lay out a snapshot into a fresh in-memory buffer
    pub fn new(data: &ArticleData) -> Result<Self> {
        Self::with_store(data, TextBuffer::new(), StructureConfig::default())
    }
}

impl<S: TextStore> Article<S> {
    /// Lay out a snapshot into `store`, which must be empty
    pub fn with_store(data: &ArticleData, mut store: S, config: StructureConfig) -> Result<Self> {
        if !store.is_empty() {
            return Err(EditError::StoreNotEmpty(store.len()));
        }
        let leading = DummySection::leading(&mut store)?;
        let mut sections = Vec::with_capacity(data.sections.len());
        for section in &data.sections {
            let at = store.end();
            match Section::insert(&mut store, section, at, &config)? {
                Some(section) => sections.push(section),
                None => tracing::debug!("skipping section {} without content", section.id),
            }
        }
        let trailing = DummySection::trailing(&mut store)?;
        tracing::debug!(
            "laid out article {} with {} sections in {} characters",
            data.id,
            sections.len(),
            store.len()
        );

        Ok(Self {
            id: data.id,
            source_article_id: data.source_article_id,
            title: data.title.clone(),
            theme: data.theme.clone(),
            image_list: data.image_list.clone(),
            sections,
            leading,
            trailing,
            drag: None,
            config,
            store,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct access for free-form edits. The hierarchy is only trusted
    /// again after [`Article::reconcile`].
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &StructureConfig {
        &self.config
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Current text of the whole document
    pub fn text(&self) -> String {
        self.store.text()
    }

    // =========================================================================
    // Ranges
    // =========================================================================

    pub(crate) fn check_position(&self, position: Position) -> Result<()> {
        if position > self.store.end() {
            return Err(EditError::InvalidTarget(format!(
                "position {} beyond document end {}",
                position,
                self.store.end()
            )));
        }
        Ok(())
    }

    pub(crate) fn section_starts(&self) -> Result<Vec<Position>> {
        Ok(starts(&self.sections, &self.store)?)
    }

    /// Where section `index` ends: the next section's start or the document end
    pub(crate) fn section_end(&self, index: usize) -> Result<Position> {
        match self.sections.get(index + 1) {
            Some(next) => Ok(next.start(&self.store)?),
            None => Ok(self.store.end()),
        }
    }

    pub fn section_range(&self, index: usize) -> Result<Range> {
        let section = self.section(index)?;
        Ok(Range::new(section.start(&self.store)?, self.section_end(index)?))
    }

    pub(crate) fn section(&self, index: usize) -> Result<&Section> {
        self.sections
            .get(index)
            .ok_or_else(|| EditError::InvalidTarget(format!("no section {}", index)))
    }

    pub(crate) fn paragraph(&self, section: usize, index: usize) -> Result<&Paragraph> {
        self.section(section)?
            .paragraphs()
            .get(index)
            .ok_or_else(|| EditError::InvalidTarget(format!("no paragraph {} in section {}", index, section)))
    }

    pub(crate) fn paragraph_end(&self, section: usize, index: usize) -> Result<Position> {
        let end = self.section_end(section)?;
        Ok(self.section(section)?.gap_position(&self.store, index + 1, end)?)
    }

    /// Range of one sentence, given its path
    pub fn sentence_range(&self, section: usize, paragraph: usize, sentence: usize) -> Result<Range> {
        let starts = self.paragraph(section, paragraph)?.sentence_starts(&self.store)?;
        let ends = ends(&starts, self.paragraph_end(section, paragraph)?);
        match (starts.get(sentence), ends.get(sentence)) {
            (Some(start), Some(end)) => Ok(Range::new(*start, *end)),
            _ => Err(EditError::InvalidTarget(format!(
                "no sentence {} in paragraph {} of section {}",
                sentence, paragraph, section
            ))),
        }
    }

    /// Marks of sentences starting exactly at `at`; text inserted there has
    /// to push them forward
    pub(crate) fn followers(&self, at: Position) -> Result<Vec<MarkId>> {
        let mut marks = Vec::new();
        for mark in self.sections.iter().flat_map(Section::marks) {
            if self.store.mark_position(mark)? == at {
                marks.push(mark);
            }
        }
        Ok(marks)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The section containing `position`. A boundary belongs to the section
    /// starting there; the document end belongs to the trailing dummy.
    pub fn section_at(&self, position: Position) -> Result<SectionSlot> {
        self.check_position(position)?;
        let end = self.trailing.start(&self.store)?;
        if self.sections.is_empty() || position >= end {
            return Ok(SectionSlot::Trailing);
        }
        Ok(match exact_index(&self.section_starts()?, position) {
            Some(index) => SectionSlot::Body(index),
            None => SectionSlot::Leading,
        })
    }

    /// Section and paragraph indices of the paragraph containing `position`
    pub fn paragraph_at(&self, position: Position) -> Result<Option<(usize, usize)>> {
        match self.section_at(position)? {
            SectionSlot::Body(section) => {
                let paragraph = self.sections[section].exact_paragraph(&self.store, position)?;
                Ok(Some((section, paragraph)))
            }
            SectionSlot::Leading | SectionSlot::Trailing => Ok(None),
        }
    }

    /// Section, paragraph and sentence indices of the sentence containing `position`
    pub fn sentence_at(&self, position: Position) -> Result<Option<(usize, usize, usize)>> {
        let Some((section, paragraph)) = self.paragraph_at(position)? else {
            return Ok(None);
        };
        let starts = self.paragraph(section, paragraph)?.sentence_starts(&self.store)?;
        let sentence = exact_index(&starts, position).unwrap_or(0);
        Ok(Some((section, paragraph, sentence)))
    }

    /// The section nearest `position`, for gap queries
    fn nearest_section(&self, position: Position) -> Result<Option<usize>> {
        Ok(match self.section_at(position)? {
            SectionSlot::Body(index) => Some(index),
            SectionSlot::Leading => Some(0),
            SectionSlot::Trailing => self.sections.len().checked_sub(1),
        })
    }

    /// Position of the section boundary closest to `position`
    pub fn best_section_gap(&self, position: Position) -> Result<Position> {
        self.check_position(position)?;
        let starts = self.section_starts()?;
        let end = self.store.end();
        let gap = best_gap(&starts, end, position);
        Ok(starts.get(gap).copied().unwrap_or(end))
    }

    /// Position of the paragraph boundary closest to `position` within its
    /// section, never inside the closing blank paragraphs
    pub fn best_paragraph_gap(&self, position: Position) -> Result<Position> {
        let Some(index) = self.nearest_section(position)? else {
            return Ok(self.store.end());
        };
        let end = self.section_end(index)?;
        let section = &self.sections[index];
        let gap = section.best_paragraph_gap(&self.store, end, position)?;
        Ok(section.gap_position(&self.store, gap, end)?)
    }

    /// Position of the sentence boundary closest to `position` within its
    /// paragraph, never after the separator
    pub fn best_sentence_gap(&self, position: Position) -> Result<Position> {
        let Some(section) = self.nearest_section(position)? else {
            return Ok(self.store.end());
        };
        let index = self.sections[section].exact_paragraph(&self.store, position)?;
        let end = self.paragraph_end(section, index)?;
        let paragraph = self.paragraph(section, index)?;
        let gap = paragraph.best_sentence_gap(&self.store, end, position)?;
        Ok(paragraph.gap_position(&self.store, gap)?)
    }

    /// Range to highlight for a selection request. A collapsed request
    /// selects the sentence under it.
    pub fn highlight(&self, start: Position, end: Position) -> Result<Range> {
        self.check_position(start)?;
        self.check_position(end)?;
        if start != end {
            return Ok(Range::new(start, end));
        }
        match self.sentence_at(start)? {
            Some((section, paragraph, sentence)) => self.sentence_range(section, paragraph, sentence),
            None => Ok(Range::collapsed(start)),
        }
    }

    /// Ranges of every section, paragraph and sentence in document order
    pub fn layout(&self) -> Result<Vec<SectionLayout>> {
        let mut layout = Vec::with_capacity(self.sections.len());
        for (index, section) in self.sections.iter().enumerate() {
            let end = self.section_end(index)?;
            layout.push(SectionLayout {
                range: Range::new(section.start(&self.store)?, end),
                paragraphs: section.spans(&self.store, end)?,
            });
        }
        Ok(layout)
    }

    // =========================================================================
    // Integrity
    // =========================================================================

    /// Renumber sections 1-based, and their paragraphs and sentences per parent
    pub fn generate_ids(&mut self) {
        for (index, section) in self.sections.iter_mut().enumerate() {
            section.id = index as u32 + 1;
            section.assign_ids();
        }
    }

    /// Check the structural invariants without repairing anything
    pub fn validate(&self) -> IntegrityReport {
        let mut report = IntegrityReport::new();
        if let Err(err) = self.check_invariants(&mut report) {
            report.push(IntegrityIssue::Unrecoverable {
                message: err.to_string(),
            });
        }
        report
    }

    fn check_invariants(&self, report: &mut IntegrityReport) -> Result<()> {
        let leading = self.leading.start(&self.store)?;
        if leading != self.store.start() {
            report.push(IntegrityIssue::DummyMisplaced {
                offset: leading.offset(),
            });
        }
        let trailing = self.trailing.start(&self.store)?;
        if trailing != self.store.end() {
            report.push(IntegrityIssue::DummyMisplaced {
                offset: trailing.offset(),
            });
        }

        let separator = self.config.separator.to_string();
        let mut previous: Option<Position> = None;
        for (index, section) in self.sections.iter().enumerate() {
            let content_len = section.content_len();
            if content_len == 0 {
                report.push(IntegrityIssue::EmptySection { section: index });
            }
            if !section.paragraphs().last().is_some_and(Paragraph::is_blank) {
                report.push(IntegrityIssue::UnterminatedSection { section: index });
            }

            let end = self.section_end(index)?;
            let spans = section.spans(&self.store, end)?;
            for (number, (paragraph, span)) in section.paragraphs().iter().zip(&spans).enumerate() {
                if paragraph.is_blank() && number < content_len {
                    report.push(IntegrityIssue::MisplacedBlank {
                        section: index,
                        paragraph: number,
                    });
                }
                for (position, range) in span.sentences.iter().enumerate() {
                    if previous.is_some_and(|previous| range.start <= previous) {
                        report.push(IntegrityIssue::OutOfOrder {
                            offset: range.start.offset(),
                        });
                    }
                    previous = Some(range.start);

                    let text = self.store.slice(range.start, range.end)?;
                    if position == paragraph.content_len() {
                        if text != separator {
                            report.push(IntegrityIssue::MissingSeparator {
                                section: index,
                                paragraph: number,
                            });
                        }
                    } else if text.is_empty() || text.contains(self.config.separator) {
                        report.push(IntegrityIssue::MalformedSentence {
                            section: index,
                            paragraph: number,
                            sentence: position,
                        });
                    }
                }
            }
        }

        let dragged = if self.drag.is_some() { 2 } else { 0 };
        let expected = self.sections.iter().map(Section::sentence_count).sum::<usize>() + 2 + dragged;
        let actual = self.store.mark_count();
        if expected != actual {
            report.push(IntegrityIssue::MarkMismatch { expected, actual });
        }
        Ok(())
    }

    /// Pin the dummy sections back to the document's ends
    pub(crate) fn reset_dummies(&mut self) -> Result<()> {
        let start = self.store.start();
        let end = self.store.end();
        self.leading.reset(&mut self.store, start)?;
        self.trailing.reset(&mut self.store, end)?;
        Ok(())
    }

    /// Reconcile, validate and export the hierarchy.
    ///
    /// Fails with [`EditError::StructuralInconsistency`] instead of returning
    /// a tree reconciliation could not make consistent.
    pub fn extract(&mut self) -> Result<ArticleData> {
        let mut report = self.reconcile();
        report.merge(self.validate());
        if report.has_errors() {
            let message = report
                .worst()
                .map(ToString::to_string)
                .unwrap_or_default();
            tracing::error!("refusing to extract article {}: {}", self.id, message);
            return Err(EditError::StructuralInconsistency(message));
        }

        let mut sections = Vec::with_capacity(self.sections.len());
        for (index, section) in self.sections.iter().enumerate() {
            sections.push(section.to_data(&self.store, self.section_end(index)?)?);
        }
        Ok(ArticleData {
            id: self.id,
            source_article_id: self.source_article_id,
            title: self.title.clone(),
            theme: self.theme.clone(),
            sections,
            image_list: self.image_list.clone(),
        })
    }

    /// Find the paragraph closed by the separator sentence `mark`
    pub(crate) fn find_paragraph(&self, mark: MarkId) -> Option<(usize, usize)> {
        self.sections.iter().enumerate().find_map(|(section, s)| {
            s.paragraphs()
                .iter()
                .position(|p| p.separator().map(Sentence::mark) == Some(mark))
                .map(|paragraph| (section, paragraph))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{ParagraphData, SectionData, SentenceData};

    fn article(sections: &[&[&[&str]]]) -> Article {
        let sections = sections
            .iter()
            .map(|paragraphs| {
                SectionData::new(
                    paragraphs
                        .iter()
                        .map(|sentences| {
                            ParagraphData::new(sentences.iter().map(|t| SentenceData::text(*t)).collect())
                        })
                        .collect(),
                )
            })
            .collect();
        Article::new(&ArticleData::new("Test", sections)).unwrap()
    }

    #[test]
    fn test_layout_of_new_article() {
        let article = article(&[&[&["A. ", "B."], &["C."]], &[&["D."]]]);
        assert_eq!(article.text(), "A. B.\nC.\n\nD.\n\n");
        assert_eq!(article.section_count(), 2);
        assert!(article.validate().is_clean());

        let layout = article.layout().unwrap();
        assert_eq!(layout[0].range, Range::new(Position::new(0), Position::new(10)));
        assert_eq!(layout[1].range, Range::new(Position::new(10), Position::new(14)));
        assert_eq!(layout[0].paragraphs.len(), 3);
    }

    #[test]
    fn test_store_must_be_empty() {
        let store = TextBuffer::from_text("x");
        let result = Article::with_store(&ArticleData::default(), store, StructureConfig::default());
        assert!(matches!(result, Err(EditError::StoreNotEmpty(1))));
    }

    #[test]
    fn test_section_at_boundaries() {
        let article = article(&[&[&["A."]], &[&["B."]]]);
        // "A.\n\nB.\n\n"
        assert_eq!(article.section_at(Position::new(0)).unwrap(), SectionSlot::Body(0));
        assert_eq!(article.section_at(Position::new(3)).unwrap(), SectionSlot::Body(0));
        assert_eq!(article.section_at(Position::new(4)).unwrap(), SectionSlot::Body(1));
        assert_eq!(article.section_at(Position::new(8)).unwrap(), SectionSlot::Trailing);
        assert!(article.section_at(Position::new(9)).is_err());
    }

    #[test]
    fn test_sentence_at_and_highlight() {
        let article = article(&[&[&["One. ", "Two."]]]);
        assert_eq!(article.sentence_at(Position::new(6)).unwrap(), Some((0, 0, 1)));
        assert_eq!(
            article.highlight(Position::new(6), Position::new(6)).unwrap(),
            Range::new(Position::new(5), Position::new(9))
        );
        assert_eq!(
            article.highlight(Position::new(7), Position::new(2)).unwrap(),
            Range::new(Position::new(2), Position::new(7))
        );
    }

    #[test]
    fn test_best_gaps() {
        let article = article(&[&[&["Ab. ", "Cd."], &["Ef."]], &[&["Gh."]]]);
        // "Ab. Cd.\nEf.\n\nGh.\n\n"
        assert_eq!(article.best_sentence_gap(Position::new(5)).unwrap(), Position::new(4));
        assert_eq!(article.best_sentence_gap(Position::new(7)).unwrap(), Position::new(7));
        assert_eq!(article.best_paragraph_gap(Position::new(6)).unwrap(), Position::new(8));
        assert_eq!(article.best_paragraph_gap(Position::new(11)).unwrap(), Position::new(12));
        assert_eq!(article.best_section_gap(Position::new(3)).unwrap(), Position::new(0));
        assert_eq!(article.best_section_gap(Position::new(10)).unwrap(), Position::new(13));
    }

    #[test]
    fn test_extract_round_trips_metadata() {
        let mut sentence = SentenceData::text("Hi.");
        sentence.id = 1;
        sentence.source_sentence_id = Some(4);
        let mut paragraph = ParagraphData::new(vec![sentence]);
        paragraph.id = 1;
        let mut section = SectionData::new(vec![paragraph]);
        section.id = 1;
        section.source_section_id = Some(2);
        let mut data = ArticleData::new("Greeting", vec![section]);
        data.id = 7;
        data.theme = "Manners".into();

        let mut article = Article::new(&data).unwrap();
        assert_eq!(article.extract().unwrap(), data);
    }

    #[test]
    fn test_validate_reports_mark_leak() {
        let mut article = article(&[&[&["A."]]]);
        article.store_mut().create_mark(Position::new(1), text_store::Gravity::Left).unwrap();
        let report = article.validate();
        assert!(report
            .issues
            .contains(&IntegrityIssue::MarkMismatch { expected: 5, actual: 6 }));
    }

    #[test]
    fn test_extract_ignores_marks_held_by_store_users() {
        let mut article = article(&[&[&["A. ", "B."]]]);
        let cursor = article
            .store_mut()
            .create_mark(Position::new(1), text_store::Gravity::Right)
            .unwrap();
        let data = article.extract().unwrap();
        assert_eq!(data.sections[0].paragraphs[0].sentences.len(), 2);
        assert_eq!(article.store().mark_position(cursor).unwrap(), Position::new(1));
    }

    #[test]
    fn test_validate_reports_unterminated_section() {
        let mut article = article(&[&[&["A."]]]);
        // Deleting the closing blank leaves the section without a terminator
        article.store_mut().delete(Position::new(3), Position::new(4)).unwrap();
        let report = article.validate();
        assert!(report.has_errors());
    }

    #[test]
    fn test_empty_article() {
        let mut article = Article::new(&ArticleData::default()).unwrap();
        assert_eq!(article.section_at(Position::zero()).unwrap(), SectionSlot::Trailing);
        assert_eq!(article.paragraph_at(Position::zero()).unwrap(), None);
        assert!(article.extract().unwrap().sections.is_empty());
    }
}
