//! Section Model - runs of paragraphs closed by blank paragraphs
//!
//! A section's text is its content paragraphs followed by one or more blank
//! paragraphs, so a well-formed section ends with two separators. This module
//! also holds the section-internal half of reconciliation: re-deriving
//! sentences, paragraphs and sections from whatever text a section's range
//! holds after free-form edits.

use crate::{
    best_gap, ends, exact_index, shift_marks, starts, DocModelError, IntegrityIssue,
    IntegrityReport, Paragraph, Result, RunElement, SectionData, Sentence, Span,
    StructureConfig,
};
use serde::Serialize;
use text_store::{Gravity, MarkId, Position, Range, TextStore};

// =============================================================================
// Section
// =============================================================================

/// A section bound to a text store
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: u32,
    pub source_article_id: Option<u32>,
    pub source_section_id: Option<u32>,
    paragraphs: Vec<Paragraph>,
}

/// Range of one paragraph and of each of its sentences, separator last
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphSpan {
    pub range: Range,
    pub sentences: Vec<Range>,
}

/// Sections re-derived from one section's text
#[derive(Debug, Default)]
pub struct Regrouped {
    /// Blank paragraphs found before any content; they belong to whatever precedes
    pub leading_blanks: Vec<Paragraph>,
    pub sections: Vec<Section>,
}

impl Section {
    pub fn from_paragraphs(
        paragraphs: Vec<Paragraph>,
        source_article_id: Option<u32>,
        source_section_id: Option<u32>,
    ) -> Self {
        Self {
            id: 0,
            source_article_id,
            source_section_id,
            paragraphs,
        }
    }

    /// Insert a snapshot section's text at `at`, closed by one blank paragraph.
    ///
    /// Returns `None`, leaving the store untouched, when the snapshot has no
    /// content.
    pub fn insert<S: TextStore>(
        store: &mut S,
        data: &SectionData,
        at: Position,
        config: &StructureConfig,
    ) -> Result<Option<Self>> {
        if data.is_empty() {
            return Ok(None);
        }
        let mut cursor = at;
        let mut paragraphs = Vec::with_capacity(data.paragraphs.len() + 1);
        for paragraph in &data.paragraphs {
            let before = store.len();
            if let Some(paragraph) = Paragraph::insert(store, paragraph, cursor, config)? {
                paragraphs.push(paragraph);
            }
            cursor = cursor.forward(store.len() - before);
        }
        paragraphs.push(Paragraph::blank(store, cursor, config)?);
        Ok(Some(Self {
            id: data.id,
            source_article_id: data.source_article_id,
            source_section_id: data.source_section_id,
            paragraphs,
        }))
    }

    /// Insert a section holding a single blank paragraph at `at`
    pub fn blank<S: TextStore>(store: &mut S, at: Position, config: &StructureConfig) -> Result<Self> {
        let paragraph = Paragraph::blank(store, at, config)?;
        Ok(Self::from_paragraphs(vec![paragraph], None, None))
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        &mut self.paragraphs
    }

    pub fn into_paragraphs(self) -> Vec<Paragraph> {
        self.paragraphs
    }

    /// Number of paragraphs before the closing run of blank paragraphs
    pub fn content_len(&self) -> usize {
        self.paragraphs
            .iter()
            .rposition(|paragraph| !paragraph.is_blank())
            .map_or(0, |index| index + 1)
    }

    pub fn has_content(&self) -> bool {
        self.content_len() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn sentence_count(&self) -> usize {
        self.paragraphs.iter().map(|p| p.sentences().len()).sum()
    }

    pub fn insert_paragraph(&mut self, index: usize, paragraph: Paragraph) {
        let index = index.min(self.paragraphs.len());
        self.paragraphs.insert(index, paragraph);
    }

    pub fn remove_paragraph(&mut self, index: usize) -> Option<Paragraph> {
        (index < self.paragraphs.len()).then(|| self.paragraphs.remove(index))
    }

    /// Put paragraphs carried over from a merged section in front
    pub fn prepend_paragraphs(&mut self, mut paragraphs: Vec<Paragraph>) {
        paragraphs.append(&mut self.paragraphs);
        self.paragraphs = paragraphs;
    }

    pub fn append_paragraphs(&mut self, paragraphs: Vec<Paragraph>) {
        self.paragraphs.extend(paragraphs);
    }

    /// Every sentence mark, in document order
    pub fn marks(&self) -> impl Iterator<Item = MarkId> + '_ {
        self.paragraphs
            .iter()
            .flat_map(|p| p.sentences().iter().map(Sentence::mark))
    }

    /// Renumber paragraphs and sentences, 1-based per parent. Blank
    /// paragraphs and separators get 0.
    pub fn assign_ids(&mut self) {
        let mut paragraph_id = 0;
        for paragraph in &mut self.paragraphs {
            if paragraph.is_blank() {
                paragraph.id = 0;
            } else {
                paragraph_id += 1;
                paragraph.id = paragraph_id;
            }
            let content_len = paragraph.content_len();
            for (index, sentence) in paragraph.sentences_mut().iter_mut().enumerate() {
                sentence.id = if index < content_len { index as u32 + 1 } else { 0 };
            }
        }
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    pub fn paragraph_starts<S: TextStore>(&self, store: &S) -> Result<Vec<Position>> {
        starts(&self.paragraphs, store)
    }

    /// Ranges of every paragraph and sentence, given where the section ends
    pub fn spans<S: TextStore>(&self, store: &S, end: Position) -> Result<Vec<ParagraphSpan>> {
        let flat: Vec<Position> = self
            .paragraphs
            .iter()
            .flat_map(|p| p.sentences().iter())
            .map(|sentence| sentence.start(store))
            .collect::<Result<_>>()?;
        let flat_ends = ends(&flat, end);
        let mut spans = Vec::with_capacity(self.paragraphs.len());
        let mut index = 0;
        for paragraph in &self.paragraphs {
            let count = paragraph.sentences().len();
            let sentences: Vec<Range> = (index..index + count)
                .map(|i| Range::new(flat[i], flat_ends[i]))
                .collect();
            let range = match (sentences.first(), sentences.last()) {
                (Some(first), Some(last)) => Range::new(first.start, last.end),
                _ => return Err(DocModelError::EmptyNode("paragraph without sentences".into())),
            };
            spans.push(ParagraphSpan { range, sentences });
            index += count;
        }
        Ok(spans)
    }

    /// Index of the paragraph containing `position`; the first one if it lies before
    pub fn exact_paragraph<S: TextStore>(&self, store: &S, position: Position) -> Result<usize> {
        let starts = self.paragraph_starts(store)?;
        Ok(exact_index(&starts, position).unwrap_or(0))
    }

    /// Index of the paragraph gap nearest `position`, never inside the closing blanks
    pub fn best_paragraph_gap<S: TextStore>(
        &self,
        store: &S,
        end: Position,
        position: Position,
    ) -> Result<usize> {
        let starts = self.paragraph_starts(store)?;
        Ok(best_gap(&starts, end, position).min(self.content_len()))
    }

    /// Where paragraph gap `index` lies
    pub fn gap_position<S: TextStore>(&self, store: &S, index: usize, end: Position) -> Result<Position> {
        match self.paragraphs.get(index) {
            Some(paragraph) => paragraph.start(store),
            None => Ok(end),
        }
    }

    // -------------------------------------------------------------------------
    // Splitting
    // -------------------------------------------------------------------------

    /// Split paragraph `index` before its content sentence `sentence`.
    ///
    /// Abandoned, returning `false`, when either half would have no content.
    pub fn split_paragraph<S: TextStore>(
        &mut self,
        store: &mut S,
        index: usize,
        sentence: usize,
        config: &StructureConfig,
    ) -> Result<bool> {
        let Some(paragraph) = self.paragraphs.get(index) else {
            return Ok(false);
        };
        if sentence == 0 || sentence >= paragraph.content_len() {
            tracing::debug!(
                "paragraph split at sentence {} of {} abandoned",
                sentence,
                paragraph.content_len()
            );
            return Ok(false);
        }
        let at = paragraph.gap_position(store, sentence)?;
        let follower = paragraph.content()[sentence].mark();
        let separator = Sentence::insert_separator(store, at, config)?;
        shift_marks(store, &[follower], 1)?;

        let paragraph = self.paragraphs.remove(index);
        let (first, second) = paragraph.split_at(sentence, separator);
        self.paragraphs.insert(index, second);
        self.paragraphs.insert(index, first);
        Ok(true)
    }

    /// Split before paragraph `index`, closing this section with a new blank
    /// paragraph and returning the rest as a new section.
    ///
    /// Returns `None` when either side would have no content.
    pub fn split_off<S: TextStore>(
        &mut self,
        store: &mut S,
        index: usize,
        config: &StructureConfig,
    ) -> Result<Option<Section>> {
        if index == 0 || index >= self.content_len() {
            tracing::debug!("section split at paragraph {} abandoned", index);
            return Ok(None);
        }
        let at = self.paragraphs[index].start(store)?;
        let follower = self.paragraphs[index].sentences()[0].mark();
        let blank = Paragraph::blank(store, at, config)?;
        shift_marks(store, &[follower], 1)?;

        let rest = self.paragraphs.split_off(index);
        self.paragraphs.push(blank);
        Ok(Some(Section::from_paragraphs(
            rest,
            self.source_article_id,
            self.source_section_id,
        )))
    }

    // -------------------------------------------------------------------------
    // Deletion and export
    // -------------------------------------------------------------------------

    /// Delete the content inside `range`, sentence by sentence.
    ///
    /// Fully covered sentences disappear, partially covered ones lose the
    /// covered text. Paragraphs left without content disappear with their
    /// separator; the closing blanks are kept, so a range covering only
    /// separators deletes nothing. Returns whether the section has no
    /// content left.
    pub fn delete_range<S: TextStore>(&mut self, store: &mut S, range: Range, end: Position) -> Result<bool> {
        let spans = self.spans(store, end)?;
        let mut cuts: Vec<Range> = Vec::new();
        let mut released: Vec<Sentence> = Vec::new();
        let mut survivors = Vec::with_capacity(self.paragraphs.len());

        for (paragraph, span) in std::mem::take(&mut self.paragraphs).into_iter().zip(spans) {
            if paragraph.is_blank() || !span.range.overlaps(&range) {
                survivors.push(paragraph);
                continue;
            }
            let id = paragraph.id;
            let mut sentences = paragraph.into_sentences();
            let separator = sentences.pop();
            let mut kept = Vec::with_capacity(sentences.len() + 1);
            for (sentence, covered) in sentences.into_iter().zip(&span.sentences) {
                if !covered.overlaps(&range) {
                    kept.push(sentence);
                } else if range.start <= covered.start && covered.end <= range.end {
                    cuts.push(*covered);
                    released.push(sentence);
                } else {
                    cuts.push(Range::new(
                        covered.start.max(range.start),
                        covered.end.min(range.end),
                    ));
                    kept.push(sentence);
                }
            }
            match separator {
                Some(separator) if kept.is_empty() => {
                    if let Some(covered) = span.sentences.last() {
                        cuts.push(*covered);
                    }
                    released.push(separator);
                }
                Some(separator) => {
                    kept.push(separator);
                    let mut paragraph = Paragraph::from_sentences(kept)?;
                    paragraph.id = id;
                    survivors.push(paragraph);
                }
                None => {}
            }
        }

        if cuts.is_empty() {
            tracing::debug!(
                "nothing to delete in {}..{}: only separators are covered",
                range.start,
                range.end
            );
        }
        cuts.sort_by(|a, b| b.start.cmp(&a.start));
        for cut in cuts {
            store.delete(cut.start, cut.end)?;
        }
        for sentence in released {
            sentence.release(store)?;
        }
        self.paragraphs = survivors;
        Ok(!self.has_content())
    }

    /// The content inside `[from, to)` as a run.
    ///
    /// Paragraphs covered from their start through their separator come out
    /// whole; otherwise the intersecting sentences come out clipped, and a
    /// sentence sentinel follows a partial paragraph when more content does.
    pub fn data_range<S: TextStore>(
        &self,
        store: &S,
        from: Position,
        to: Position,
        end: Position,
    ) -> Result<Vec<RunElement>> {
        let range = Range::new(from, to);
        let spans = self.spans(store, end)?;
        let mut run = Vec::new();
        let mut after_partial = false;

        for (paragraph, span) in self.paragraphs.iter().zip(&spans) {
            if paragraph.is_blank() {
                continue;
            }
            let content_len = paragraph.content_len();
            let content = Range::new(span.range.start, span.sentences[content_len].start);
            if !content.overlaps(&range) {
                continue;
            }
            if after_partial {
                run.push(RunElement::sentence_sentinel());
                after_partial = false;
            }
            if range.start <= span.range.start && span.range.end <= range.end {
                run.push(RunElement::Paragraph(paragraph.to_data(store, span.range.end)?));
                continue;
            }
            for (sentence, covered) in paragraph.content().iter().zip(&span.sentences) {
                if covered.overlaps(&range) {
                    let data = sentence.to_data_clipped(store, covered.end, range.start, range.end)?;
                    run.push(RunElement::from_sentence(data));
                }
            }
            after_partial = true;
        }
        Ok(run)
    }

    /// Snapshot of the content paragraphs, given where the section ends
    pub fn to_data<S: TextStore>(&self, store: &S, end: Position) -> Result<SectionData> {
        let starts = self.paragraph_starts(store)?;
        let ends = ends(&starts, end);
        let paragraphs = self
            .paragraphs
            .iter()
            .zip(ends)
            .filter(|(paragraph, _)| !paragraph.is_blank())
            .map(|(paragraph, end)| paragraph.to_data(store, end))
            .collect::<Result<Vec<_>>>()?;
        Ok(SectionData {
            id: self.id,
            source_article_id: self.source_article_id,
            source_section_id: self.source_section_id,
            paragraphs,
        })
    }

    /// Unregister every sentence mark
    pub fn release<S: TextStore>(self, store: &mut S) -> Result<()> {
        for paragraph in self.paragraphs {
            paragraph.release(store)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Reconciliation
    // -------------------------------------------------------------------------

    /// Re-derive this section's structure from the text in its range.
    ///
    /// `end` is where the section's text stops; the caller makes sure that
    /// text ends with two separators. Degenerate sentences are released,
    /// sentences are cut so every separator is a sentence of its own, and
    /// the pieces are regrouped into paragraphs and, at blank lines, into
    /// sections inheriting this section's source ids.
    pub fn reconcile<S: TextStore>(
        self,
        store: &mut S,
        end: Position,
        config: &StructureConfig,
        report: &mut IntegrityReport,
    ) -> Result<Regrouped> {
        let Section {
            id,
            source_article_id,
            source_section_id,
            paragraphs,
        } = self;
        let offset = match paragraphs.first() {
            Some(paragraph) => paragraph.start(store)?.offset(),
            None => return Ok(Regrouped::default()),
        };

        let sentences: Vec<Sentence> = paragraphs
            .into_iter()
            .flat_map(Paragraph::into_sentences)
            .collect();
        let sentences = drop_degenerate(store, sentences, end, report)?;
        let pieces = cut_at_separators(store, sentences, end, config, report)?;
        let paragraphs = group_paragraphs(store, pieces)?;

        let mut regrouped = Regrouped::default();
        let mut content: Vec<Paragraph> = Vec::new();
        let mut blanks: Vec<Paragraph> = Vec::new();
        let close = |content: &mut Vec<Paragraph>, blanks: &mut Vec<Paragraph>, sections: &mut Vec<Section>| {
            let mut paragraphs = std::mem::take(content);
            paragraphs.append(blanks);
            let mut section = Section::from_paragraphs(paragraphs, source_article_id, source_section_id);
            if sections.is_empty() {
                section.id = id;
            }
            sections.push(section);
        };
        for paragraph in paragraphs {
            if paragraph.is_blank() {
                if content.is_empty() && regrouped.sections.is_empty() {
                    regrouped.leading_blanks.push(paragraph);
                } else {
                    blanks.push(paragraph);
                }
            } else {
                if !blanks.is_empty() {
                    close(&mut content, &mut blanks, &mut regrouped.sections);
                }
                content.push(paragraph);
            }
        }
        if !content.is_empty() {
            close(&mut content, &mut blanks, &mut regrouped.sections);
        }

        if regrouped.sections.len() > 1 {
            report.push(IntegrityIssue::SectionRegrouped {
                offset,
                sections: regrouped.sections.len(),
            });
        }
        Ok(regrouped)
    }
}

impl Span for Section {
    fn start<S: TextStore>(&self, store: &S) -> Result<Position> {
        self.paragraphs
            .first()
            .ok_or_else(|| DocModelError::EmptyNode("section without paragraphs".into()))?
            .start(store)
    }
}

/// Release sentences whose text was deleted entirely
fn drop_degenerate<S: TextStore>(
    store: &mut S,
    sentences: Vec<Sentence>,
    end: Position,
    report: &mut IntegrityReport,
) -> Result<Vec<Sentence>> {
    let starts = starts(&sentences, store)?;
    let mut live = vec![false; sentences.len()];
    let mut next = end;
    for index in (0..sentences.len()).rev() {
        if starts[index] < next {
            live[index] = true;
            next = starts[index];
        }
    }

    let mut kept = Vec::with_capacity(sentences.len());
    for ((sentence, live), start) in sentences.into_iter().zip(live).zip(starts) {
        if live {
            kept.push(sentence);
        } else {
            report.push(IntegrityIssue::DegenerateSentence {
                offset: start.offset(),
            });
            sentence.release(store)?;
        }
    }
    Ok(kept)
}

/// Cut sentences so that every separator character is a sentence of its own.
///
/// Returns each piece with whether it is a separator. Source metadata stays
/// with the first content piece of a cut sentence.
fn cut_at_separators<S: TextStore>(
    store: &mut S,
    sentences: Vec<Sentence>,
    end: Position,
    config: &StructureConfig,
    report: &mut IntegrityReport,
) -> Result<Vec<(Sentence, bool)>> {
    let starts = starts(&sentences, store)?;
    let ends = ends(&starts, end);
    let mut pieces = Vec::with_capacity(sentences.len());

    for ((sentence, start), stop) in sentences.into_iter().zip(starts).zip(ends) {
        let text: Vec<char> = store.slice(start, stop)?.chars().collect();

        // (offset within the sentence, length, is separator)
        let mut layout: Vec<(usize, usize, bool)> = Vec::new();
        let mut run_start: Option<usize> = None;
        for (offset, ch) in text.iter().enumerate() {
            if *ch == config.separator {
                if let Some(begin) = run_start.take() {
                    layout.push((begin, offset - begin, false));
                }
                layout.push((offset, 1, true));
            } else if run_start.is_none() {
                run_start = Some(offset);
            }
        }
        if let Some(begin) = run_start {
            layout.push((begin, text.len() - begin, false));
        }
        if layout.len() > 1 {
            report.push(IntegrityIssue::SentenceCut {
                offset: start.offset(),
                pieces: layout.len(),
            });
        }

        if layout.is_empty() {
            pieces.push((sentence, false));
            continue;
        }

        let carrier = layout.iter().position(|(_, _, separator)| !separator);
        for (index, (offset, len, separator)) in layout.into_iter().enumerate() {
            let mark = if index == 0 {
                sentence.mark()
            } else {
                store.create_mark(start.forward(offset), Gravity::Left)?
            };
            let mut piece = if Some(index) == carrier {
                Sentence::with_metadata_of(mark, &sentence)
            } else {
                Sentence::from_mark(mark)
            };
            if piece.is_picture() && !text[offset..offset + len].contains(&config.picture_placeholder) {
                report.push(IntegrityIssue::PictureLost {
                    offset: start.offset() + offset,
                });
                piece.picture = None;
            }
            pieces.push((piece, separator));
        }
    }
    Ok(pieces)
}

/// Group pieces into paragraphs, each closed by a separator piece.
///
/// Content after the last separator cannot form a paragraph. Every mark is
/// then released, leaving the text to whatever precedes the section.
fn group_paragraphs<S: TextStore>(store: &mut S, pieces: Vec<(Sentence, bool)>) -> Result<Vec<Paragraph>> {
    let mut paragraphs = Vec::new();
    let mut current = Vec::new();
    for (sentence, separator) in pieces {
        current.push(sentence);
        if separator {
            paragraphs.push(Paragraph::from_sentences(std::mem::take(&mut current))?);
        }
    }
    if !current.is_empty() {
        let offset = current[0].start(store)?.offset();
        for sentence in current {
            sentence.release(store)?;
        }
        for paragraph in paragraphs {
            paragraph.release(store)?;
        }
        return Err(DocModelError::UnterminatedSection(offset));
    }
    Ok(paragraphs)
}

// =============================================================================
// Dummy sections
// =============================================================================

/// One of the two sentinel sections pinned to the document's ends.
///
/// The leading dummy is a left-gravity mark at the start; the trailing dummy
/// is a right-gravity mark at the end, so it stays behind text typed there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummySection {
    mark: MarkId,
}

impl DummySection {
    pub fn leading<S: TextStore>(store: &mut S) -> Result<Self> {
        let mark = store.create_mark(store.start(), Gravity::Left)?;
        Ok(Self { mark })
    }

    pub fn trailing<S: TextStore>(store: &mut S) -> Result<Self> {
        let mark = store.create_mark(store.end(), Gravity::Right)?;
        Ok(Self { mark })
    }

    pub fn mark(&self) -> MarkId {
        self.mark
    }

    /// Pin the mark back to `position`
    pub fn reset<S: TextStore>(&self, store: &mut S, position: Position) -> Result<()> {
        store.move_mark(self.mark, position)?;
        Ok(())
    }
}

impl Span for DummySection {
    fn start<S: TextStore>(&self, store: &S) -> Result<Position> {
        Ok(store.mark_position(self.mark)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParagraphData, SentenceData};
    use text_store::TextBuffer;

    fn section_data(paragraphs: &[&[&str]]) -> SectionData {
        SectionData::new(
            paragraphs
                .iter()
                .map(|sentences| {
                    ParagraphData::new(sentences.iter().map(|t| SentenceData::text(*t)).collect())
                })
                .collect(),
        )
    }

    fn build(paragraphs: &[&[&str]]) -> (TextBuffer, Section) {
        let mut store = TextBuffer::new();
        let section = Section::insert(
            &mut store,
            &section_data(paragraphs),
            Position::zero(),
            &StructureConfig::default(),
        )
        .unwrap()
        .unwrap();
        (store, section)
    }

    #[test]
    fn test_insert_closes_with_blank_paragraph() {
        let (store, section) = build(&[&["A. ", "B."], &["C."]]);
        assert_eq!(store.text(), "A. B.\nC.\n\n");
        assert_eq!(section.paragraphs().len(), 3);
        assert_eq!(section.content_len(), 2);
        assert_eq!(store.mark_count(), section.sentence_count());
    }

    #[test]
    fn test_spans_are_contiguous() {
        let (store, section) = build(&[&["A. ", "B."], &["C."]]);
        let spans = section.spans(&store, store.end()).unwrap();
        assert_eq!(spans[0].range, Range::new(Position::new(0), Position::new(6)));
        assert_eq!(spans[1].range, Range::new(Position::new(6), Position::new(9)));
        assert_eq!(spans[2].range, Range::new(Position::new(9), Position::new(10)));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].range.end, pair[1].range.start);
        }
    }

    #[test]
    fn test_split_paragraph_inserts_separator() {
        let (mut store, mut section) = build(&[&["A. ", "B."]]);
        let config = StructureConfig::default();
        assert!(section.split_paragraph(&mut store, 0, 1, &config).unwrap());
        assert_eq!(store.text(), "A. \nB.\n\n");
        assert_eq!(section.content_len(), 2);
        let data = section.to_data(&store, store.end()).unwrap();
        assert_eq!(data, section_data(&[&["A. "], &["B."]]));
    }

    #[test]
    fn test_split_paragraph_abandons_empty_side() {
        let (mut store, mut section) = build(&[&["A. ", "B."]]);
        let config = StructureConfig::default();
        assert!(!section.split_paragraph(&mut store, 0, 0, &config).unwrap());
        assert!(!section.split_paragraph(&mut store, 0, 2, &config).unwrap());
        assert_eq!(store.text(), "A. B.\n\n");
    }

    #[test]
    fn test_split_off_creates_second_section() {
        let (mut store, mut section) = build(&[&["A."], &["B."]]);
        section.source_section_id = Some(9);
        let config = StructureConfig::default();
        let second = section.split_off(&mut store, 1, &config).unwrap().unwrap();
        assert_eq!(store.text(), "A.\n\nB.\n\n");
        assert_eq!(second.source_section_id, Some(9));
        assert_eq!(second.start(&store).unwrap(), Position::new(4));
        assert!(section.split_off(&mut store, 0, &config).unwrap().is_none());
    }

    #[test]
    fn test_delete_range_is_sentence_granular() {
        let (mut store, mut section) = build(&[&["One. ", "Two. ", "Three."], &["Four."]]);
        // "One. Two. Three.\nFour.\n\n": cover "e. Two. T"
        let end = store.end();
        let emptied = section
            .delete_range(&mut store, Range::new(Position::new(2), Position::new(11)), end)
            .unwrap();
        assert!(!emptied);
        assert_eq!(store.text(), "Onhree.\nFour.\n\n");
        assert_eq!(section.paragraphs()[0].content_len(), 2);
        assert_eq!(store.mark_count(), section.sentence_count());
    }

    #[test]
    fn test_delete_whole_paragraph_takes_its_separator() {
        let (mut store, mut section) = build(&[&["A."], &["B."]]);
        let end = store.end();
        let emptied = section
            .delete_range(&mut store, Range::new(Position::new(0), Position::new(2)), end)
            .unwrap();
        assert!(!emptied);
        assert_eq!(store.text(), "B.\n\n");
        assert_eq!(section.paragraphs().len(), 2);

        let end = store.end();

        let emptied = section
            .delete_range(&mut store, Range::new(Position::new(0), Position::new(3)), end)
            .unwrap();
        assert!(emptied);
        assert_eq!(store.text(), "\n");
    }

    #[test]
    fn test_data_range_marks_partial_paragraphs() {
        let (store, section) = build(&[&["A. ", "B."], &["C."], &["D. ", "E."]]);
        // "A. B.\nC.\nD. E.\n\n": from inside the first paragraph to inside the last
        let run = section
            .data_range(&store, Position::new(3), Position::new(12), store.end())
            .unwrap();
        assert_eq!(
            run,
            vec![
                RunElement::Sentence(SentenceData::text("B.")),
                RunElement::sentence_sentinel(),
                RunElement::Paragraph(ParagraphData::new(vec![SentenceData::text("C.")])),
                RunElement::Sentence(SentenceData::text("D. ")),
            ]
        );
    }

    #[test]
    fn test_reconcile_cuts_typed_newline() {
        let (mut store, section) = build(&[&["Hello world."]]);
        let config = StructureConfig::default();
        store.insert(Position::new(5), "\n").unwrap();
        let mut report = IntegrityReport::new();
        let end = store.end();
        let regrouped = section.reconcile(&mut store, end, &config, &mut report).unwrap();
        assert!(regrouped.leading_blanks.is_empty());
        assert_eq!(regrouped.sections.len(), 1);
        let data = regrouped.sections[0].to_data(&store, store.end()).unwrap();
        assert_eq!(data, section_data(&[&["Hello"], &[" world."]]));
        assert!(report
            .issues
            .iter()
            .any(|issue| matches!(issue, IntegrityIssue::SentenceCut { pieces: 3, .. })));
    }

    #[test]
    fn test_reconcile_splits_at_blank_line() {
        let (mut store, mut section) = build(&[&["A."], &["B."]]);
        section.source_article_id = Some(2);
        let config = StructureConfig::default();
        // "A.\nB.\n\n" -> "A.\n\nB.\n\n"
        store.insert(Position::new(3), "\n").unwrap();
        let mut report = IntegrityReport::new();
        let end = store.end();
        let regrouped = section.reconcile(&mut store, end, &config, &mut report).unwrap();
        assert_eq!(regrouped.sections.len(), 2);
        assert!(regrouped.sections.iter().all(|s| s.source_article_id == Some(2)));
        assert_eq!(store.mark_count(), regrouped.sections.iter().map(Section::sentence_count).sum::<usize>());
    }

    #[test]
    fn test_reconcile_keeps_metadata_on_first_content_piece() {
        let mut store = TextBuffer::new();
        let config = StructureConfig::default();
        let mut sentence = SentenceData::text("Tail.");
        sentence.source_sentence_id = Some(5);
        let data = SectionData::new(vec![ParagraphData::new(vec![sentence])]);
        let section = Section::insert(&mut store, &data, Position::zero(), &config)
            .unwrap()
            .unwrap();
        // A separator typed at the sentence start: "\nTail.\n\n"
        store.insert(Position::zero(), "\n").unwrap();
        let mut report = IntegrityReport::new();
        let end = store.end();
        let regrouped = section.reconcile(&mut store, end, &config, &mut report).unwrap();
        assert_eq!(regrouped.leading_blanks.len(), 1);
        let paragraph = &regrouped.sections[0].paragraphs()[0];
        assert_eq!(paragraph.content()[0].source_sentence_id, Some(5));
        assert_eq!(regrouped.leading_blanks[0].sentences()[0].source_sentence_id, None);
    }

    #[test]
    fn test_reconcile_releases_degenerate_sentences() {
        let (mut store, section) = build(&[&["A. ", "B. ", "C."]]);
        let config = StructureConfig::default();
        store.delete(Position::new(3), Position::new(6)).unwrap();
        let mut report = IntegrityReport::new();
        let end = store.end();
        let regrouped = section.reconcile(&mut store, end, &config, &mut report).unwrap();
        assert_eq!(regrouped.sections[0].paragraphs()[0].content_len(), 2);
        assert!(report
            .issues
            .contains(&IntegrityIssue::DegenerateSentence { offset: 3 }));
        assert_eq!(store.mark_count(), regrouped.sections[0].sentence_count());
    }
}
