//! Structured insertion of runs
//!
//! A run is spliced in one level at a time. Leaf elements of the level are
//! laid out in order at the insertion point until a sentinel or a coarser
//! element shows up; leaf elements at the tail of the run are laid out
//! behind them; if a sentinel was seen, the container at the insertion point
//! is split and the rest of the run moves one level up. Sentences go into
//! paragraphs, paragraphs into sections, sections into the article.

use crate::{Article, Result, SectionSlot};
use doc_model::{
    insertion_index, shift_marks, Paragraph, RunElement, Section, Sentence, Span,
};
use std::collections::VecDeque;
use text_store::{Gravity, MarkId, Position, Range, TextStore};

/// How a run element is treated at one level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Laid out at this level
    Leaf,
    /// Ends the run's first part and is consumed
    Sentinel,
    /// Belongs to a coarser level; ends the run's first part and stays
    Boundary,
    /// Belongs to a finer level and is skipped
    Stray,
}

/// One level of the hierarchy a run is spliced into
trait Granularity {
    /// Indices of the container leaves are attached to
    type Target: Copy;

    const NAME: &'static str;

    fn role(element: &RunElement) -> Role;

    /// Replace coarser elements at the head of the run by their children
    /// followed by a sentinel
    fn unwrap_head(run: &mut VecDeque<RunElement>);

    /// Lay out one leaf at `at` and attach it to the target container
    fn place<S: TextStore>(
        article: &mut Article<S>,
        target: Self::Target,
        element: RunElement,
        at: Position,
    ) -> Result<()>;
}

/// Sentences and pictures into a paragraph
struct SentenceLevel;

/// Paragraphs into a section
struct ParagraphLevel;

fn push_children(run: &mut VecDeque<RunElement>, children: Vec<RunElement>, sentinel: RunElement) {
    run.push_front(sentinel);
    for child in children.into_iter().rev() {
        run.push_front(child);
    }
}

/// Whether anything but sentinels is left; trailing sentinels split nothing
fn has_content(run: &VecDeque<RunElement>) -> bool {
    run.iter().any(|element| !element.is_sentinel())
}

fn section_children(data: doc_model::SectionData) -> Vec<RunElement> {
    data.paragraphs
        .into_iter()
        .filter(|paragraph| !paragraph.is_empty())
        .map(RunElement::Paragraph)
        .collect()
}

impl Granularity for SentenceLevel {
    type Target = (usize, usize);

    const NAME: &'static str = "sentence";

    fn role(element: &RunElement) -> Role {
        match element {
            RunElement::Sentence(data) if data.is_sentinel() => Role::Sentinel,
            RunElement::Sentence(_) | RunElement::Picture(_) => Role::Leaf,
            RunElement::Paragraph(_) | RunElement::Section(_) => Role::Boundary,
        }
    }

    fn unwrap_head(run: &mut VecDeque<RunElement>) {
        loop {
            match run.pop_front() {
                Some(RunElement::Section(data)) => {
                    push_children(run, section_children(data), RunElement::paragraph_sentinel());
                }
                Some(RunElement::Paragraph(data)) => {
                    let children = data
                        .sentences
                        .into_iter()
                        .filter(|sentence| !sentence.is_sentinel())
                        .map(RunElement::from_sentence)
                        .collect();
                    push_children(run, children, RunElement::sentence_sentinel());
                }
                Some(other) => {
                    run.push_front(other);
                    return;
                }
                None => return,
            }
        }
    }

    fn place<S: TextStore>(
        article: &mut Article<S>,
        (section, paragraph): Self::Target,
        element: RunElement,
        at: Position,
    ) -> Result<()> {
        let data = match element {
            RunElement::Sentence(data) | RunElement::Picture(data) => data,
            other => {
                tracing::warn!("cannot place {} element as a sentence", other.kind());
                return Ok(());
            }
        };
        article.paragraph(section, paragraph)?;

        let followers = article.followers(at)?;
        let before = article.store.len();
        let sentence = Sentence::insert(&mut article.store, &data, at, &article.config)?;
        let added = article.store.len() - before;
        shift_marks(&mut article.store, &followers, added)?;

        let Article { sections, store, .. } = article;
        let paragraph = &mut sections[section].paragraphs_mut()[paragraph];
        let index = paragraph.sentence_insertion_index(store, at)?;
        paragraph.insert_sentence(index, sentence);
        Ok(())
    }
}

impl Granularity for ParagraphLevel {
    type Target = usize;

    const NAME: &'static str = "paragraph";

    fn role(element: &RunElement) -> Role {
        match element {
            RunElement::Paragraph(data) if data.is_empty() => Role::Sentinel,
            RunElement::Paragraph(_) => Role::Leaf,
            RunElement::Section(_) => Role::Boundary,
            RunElement::Sentence(_) | RunElement::Picture(_) => Role::Stray,
        }
    }

    fn unwrap_head(run: &mut VecDeque<RunElement>) {
        match run.pop_front() {
            Some(RunElement::Section(data)) => {
                push_children(run, section_children(data), RunElement::paragraph_sentinel());
            }
            Some(other) => run.push_front(other),
            None => {}
        }
    }

    fn place<S: TextStore>(
        article: &mut Article<S>,
        section: Self::Target,
        element: RunElement,
        at: Position,
    ) -> Result<()> {
        let data = match element {
            RunElement::Paragraph(data) => data,
            other => {
                tracing::warn!("cannot place {} element as a paragraph", other.kind());
                return Ok(());
            }
        };
        article.section(section)?;

        let followers = article.followers(at)?;
        let before = article.store.len();
        let Some(paragraph) = Paragraph::insert(&mut article.store, &data, at, &article.config)? else {
            return Ok(());
        };
        let added = article.store.len() - before;
        shift_marks(&mut article.store, &followers, added)?;

        let Article { sections, store, .. } = article;
        let section = &mut sections[section];
        let index = insertion_index(&section.paragraph_starts(store)?, at);
        section.insert_paragraph(index, paragraph);
        Ok(())
    }
}

/// Pads added so the run has a container to go into; dropped again if the
/// run left them empty. Identified by their separator marks.
#[derive(Debug, Default)]
struct Pads {
    section: Option<MarkId>,
    paragraph: Option<MarkId>,
}

impl<S: TextStore> Article<S> {
    /// Insert a run at `at` and return the range it now occupies.
    ///
    /// Inserting at the document end first appends a blank section to
    /// insert into. A run without any text changes nothing.
    pub fn insert(&mut self, run: Vec<RunElement>, at: Position) -> Result<Range> {
        self.check_position(at)?;
        if run
            .iter()
            .all(|element| element.layout_text(&self.config).is_empty())
        {
            return Ok(Range::collapsed(at));
        }

        let mut transient = Vec::new();
        let result = self.insert_run(run.into(), at, &mut transient);
        for mark in transient {
            if let Err(err) = self.store.delete_mark(mark) {
                tracing::warn!("failed to release insertion mark {}: {}", mark, err);
            }
        }
        match &result {
            Ok(range) => tracing::debug!("inserted run at {}..{}", range.start, range.end),
            Err(err) => tracing::error!("insertion at {} failed: {}", at, err),
        }
        result
    }

    fn transient_mark(&mut self, at: Position, gravity: Gravity, transient: &mut Vec<MarkId>) -> Result<MarkId> {
        let mark = self.store.create_mark(at, gravity)?;
        transient.push(mark);
        Ok(mark)
    }

    fn insert_run(
        &mut self,
        mut run: VecDeque<RunElement>,
        at: Position,
        transient: &mut Vec<MarkId>,
    ) -> Result<Range> {
        let mut pads = Pads::default();
        let section = match self.section_at(at)? {
            SectionSlot::Body(index) => index,
            SectionSlot::Leading => 0,
            SectionSlot::Trailing => {
                let end = self.store.end();
                let followers = self.followers(end)?;
                let before = self.store.len();
                let pad = Section::blank(&mut self.store, end, &self.config)?;
                let added = self.store.len() - before;
                shift_marks(&mut self.store, &followers, added)?;
                pads.section = pad.marks().next();
                self.sections.push(pad);
                self.sections.len() - 1
            }
        };

        let mut paragraph = self.sections[section].exact_paragraph(&self.store, at)?;
        if self.paragraph(section, paragraph)?.is_blank() {
            // new content goes in front of the first closing blank
            paragraph = paragraph.min(self.sections[section].content_len());
        }
        let point = if self.paragraph(section, paragraph)?.is_blank() {
            let start = self.paragraph(section, paragraph)?.start(&self.store)?;
            let followers = self.followers(start)?;
            let before = self.store.len();
            let pad = Paragraph::blank(&mut self.store, start, &self.config)?;
            let added = self.store.len() - before;
            shift_marks(&mut self.store, &followers, added)?;
            pads.paragraph = pad.separator().map(Sentence::mark);
            self.sections[section].insert_paragraph(paragraph, pad);
            start
        } else {
            let end = self.paragraph_end(section, paragraph)?;
            let target = self.paragraph(section, paragraph)?;
            let gap = target.best_sentence_gap(&self.store, end, at)?;
            target.gap_position(&self.store, gap)?
        };

        let section_start = self.sections[section].start(&self.store)?;
        let section_end = self.section_end(section)?;
        let start_anchor = self.transient_mark(section_start, Gravity::Left, transient)?;
        let end_anchor = self.transient_mark(section_end, Gravity::Right, transient)?;
        let start_dist = point.offset() - section_start.offset();
        let end_dist = section_end.offset() - point.offset();

        if let Some(split) = self.splice::<SentenceLevel>((section, paragraph), point, &mut run, transient)? {
            let split = self.store.mark_position(split)?;
            let next = self.split_paragraph_at(section, paragraph, split)?;
            if has_content(&run) {
                self.insert_paragraphs(section, next, &mut run, transient)?;
            }
        }
        for element in &run {
            if !element.is_sentinel() {
                tracing::warn!("{} element left over after insertion", element.kind());
            }
        }

        let removed = self.drop_pads(pads)?;
        let start = self
            .store
            .mark_position(start_anchor)?
            .forward(start_dist)
            .min(self.store.end());
        let end = self
            .store
            .mark_position(end_anchor)?
            .backward(end_dist.saturating_sub(removed));
        Ok(Range::new(start, end.max(start)))
    }

    /// Leading and trailing phases of one level. Returns the split mark when
    /// the run asks for the container at the insertion point to be split.
    fn splice<G: Granularity>(
        &mut self,
        target: G::Target,
        at: Position,
        run: &mut VecDeque<RunElement>,
        transient: &mut Vec<MarkId>,
    ) -> Result<Option<MarkId>> {
        G::unwrap_head(run);
        let cursor = self.transient_mark(at, Gravity::Right, transient)?;

        let mut split = false;
        while let Some(element) = run.pop_front() {
            match G::role(&element) {
                Role::Leaf => {
                    let at = self.store.mark_position(cursor)?;
                    G::place(self, target, element, at)?;
                }
                Role::Sentinel => {
                    split = true;
                    break;
                }
                Role::Boundary => {
                    run.push_front(element);
                    split = true;
                    break;
                }
                Role::Stray => {
                    if !element.is_sentinel() {
                        tracing::warn!("skipping {} element at {} level", element.kind(), G::NAME);
                    }
                }
            }
        }

        let split_at = self.store.mark_position(cursor)?;
        let split_mark = self.transient_mark(split_at, Gravity::Left, transient)?;
        while let Some(element) = run.pop_back() {
            if G::role(&element) != Role::Leaf {
                run.push_back(element);
                break;
            }
            let at = self.store.mark_position(split_mark)?;
            G::place(self, target, element, at)?;
        }
        Ok(split.then_some(split_mark))
    }

    /// Split paragraph `index` at `at` and return where paragraphs following
    /// the split go
    fn split_paragraph_at(&mut self, section: usize, index: usize, at: Position) -> Result<Position> {
        let target = self.paragraph(section, index)?;
        let sentence = insertion_index(&target.sentence_starts(&self.store)?, at).min(target.content_len());
        {
            let Article {
                sections,
                store,
                config,
                ..
            } = &mut *self;
            sections[section].split_paragraph(store, index, sentence, config)?;
        }
        let gap = if sentence == 0 { index } else { index + 1 };
        let end = self.section_end(section)?;
        Ok(self.sections[section].gap_position(&self.store, gap, end)?)
    }

    /// Paragraph-level phases, then sections for whatever is left
    fn insert_paragraphs(
        &mut self,
        section: usize,
        at: Position,
        run: &mut VecDeque<RunElement>,
        transient: &mut Vec<MarkId>,
    ) -> Result<()> {
        let Some(split) = self.splice::<ParagraphLevel>(section, at, run, transient)? else {
            return Ok(());
        };
        if !has_content(run) {
            return Ok(());
        }
        let split = self.store.mark_position(split)?;
        let (index, at) = self.split_section_at(section, split)?;
        self.insert_sections(index, at, run)
    }

    /// Split section `index` before the first paragraph starting at or after
    /// `at`. Returns the section index and position where sections go.
    fn split_section_at(&mut self, index: usize, at: Position) -> Result<(usize, Position)> {
        let target = self.section(index)?;
        let gap = insertion_index(&target.paragraph_starts(&self.store)?, at);
        if gap == 0 {
            return Ok((index, target.start(&self.store)?));
        }
        let end = self.section_end(index)?;
        if gap >= target.content_len() {
            return Ok((index + 1, end));
        }

        let Article {
            sections,
            store,
            config,
            ..
        } = &mut *self;
        match sections[index].split_off(store, gap, config)? {
            Some(second) => {
                let start = second.start(store)?;
                sections.insert(index + 1, second);
                Ok((index + 1, start))
            }
            None => Ok((index + 1, end)),
        }
    }

    /// Insert the section elements of the run one after another
    fn insert_sections(&mut self, mut index: usize, mut at: Position, run: &mut VecDeque<RunElement>) -> Result<()> {
        while let Some(element) = run.pop_front() {
            match element {
                RunElement::Section(data) => {
                    let followers = self.followers(at)?;
                    let before = self.store.len();
                    let Some(section) = Section::insert(&mut self.store, &data, at, &self.config)? else {
                        continue;
                    };
                    let added = self.store.len() - before;
                    shift_marks(&mut self.store, &followers, added)?;
                    self.sections.insert(index, section);
                    index += 1;
                    at = at.forward(added);
                }
                other if other.is_sentinel() => {}
                other => tracing::warn!("skipping {} element at section level", other.kind()),
            }
        }
        Ok(())
    }

    /// Remove pads the run left empty; returns how many characters went
    fn drop_pads(&mut self, pads: Pads) -> Result<usize> {
        let mut removed = 0;
        if let Some((section, index)) = pads.paragraph.and_then(|mark| self.find_paragraph(mark)) {
            if self.paragraph(section, index)?.is_blank() {
                let start = self.paragraph(section, index)?.start(&self.store)?;
                let end = self.paragraph_end(section, index)?;
                if let Some(pad) = self.sections[section].remove_paragraph(index) {
                    self.store.delete(start, end)?;
                    pad.release(&mut self.store)?;
                    removed += end.offset() - start.offset();
                }
            }
        }
        if let Some((section, _)) = pads.section.and_then(|mark| self.find_paragraph(mark)) {
            if !self.sections[section].has_content() {
                removed += self.remove_section_at(section)?.len();
            }
        }
        if removed > 0 {
            tracing::debug!("dropped {} characters of unused padding", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EditError;
    use doc_model::{ArticleData, ImageRef, ParagraphData, SectionData, SentenceData};

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

    fn sentence(text: &str) -> RunElement {
        RunElement::Sentence(SentenceData::text(text))
    }

    fn selected(article: &Article, range: Range) -> String {
        article.store().slice(range.start, range.end).unwrap()
    }

    #[test]
    fn test_sentences_go_to_nearest_gap() {
        let mut article = article(&[&[&["X. ", "Y."]]]);
        let range = article.insert(vec![sentence("A. ")], Position::new(4)).unwrap();
        assert_eq!(article.text(), "X. A. Y.\n\n");
        assert_eq!(selected(&article, range), "A. ");
        assert_eq!(article.sections()[0].paragraphs()[0].content_len(), 3);
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_sentinel_splits_paragraph() {
        let mut article = article(&[&[&["X. ", "Y."]]]);
        let run = vec![sentence("A "), RunElement::sentence_sentinel(), sentence("B.")];
        let range = article.insert(run, Position::new(3)).unwrap();
        assert_eq!(article.text(), "X. A \nB.Y.\n\n");
        assert_eq!(range, Range::new(Position::new(3), Position::new(8)));
        let section = &article.sections()[0];
        assert_eq!(section.content_len(), 2);
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_trailing_paragraph_sentinel_only_splits_paragraph() {
        let mut article = article(&[&[&["One. ", "Two."]]]);
        let run = vec![sentence("A "), RunElement::paragraph_sentinel(), sentence("B.")];
        article.insert(run, Position::new(5)).unwrap();
        assert_eq!(article.text(), "One. A \nB.Two.\n\n");
        assert_eq!(article.section_count(), 1);
        assert_eq!(article.sections()[0].content_len(), 2);
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_paragraph_of_empty_sentences_acts_as_sentinel() {
        let mut article = article(&[&[&["One. ", "Two."]]]);
        let hollow = ParagraphData::new(vec![SentenceData::sentinel()]);
        let run = vec![sentence("A "), RunElement::Paragraph(hollow), sentence("B.")];
        article.insert(run, Position::new(5)).unwrap();
        assert_eq!(article.text(), "One. A \nB.Two.\n\n");
        assert_eq!(article.section_count(), 1);
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_paragraph_sentinel_splits_section() {
        let mut article = article(&[&[&["X. ", "Y."]]]);
        let run = vec![
            sentence("B."),
            RunElement::paragraph_sentinel(),
            RunElement::Section(section_data(&[&["D."]])),
        ];
        let range = article.insert(run, Position::new(3)).unwrap();
        assert_eq!(article.text(), "X. B.\n\nD.\n\nY.\n\n");
        assert_eq!(article.section_count(), 3);
        assert_eq!(selected(&article, range), "B.\n\nD.\n\n");
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_insert_at_document_end_pads_a_section() {
        let mut article = article(&[&[&["X."]]]);
        let end = article.store().end();
        let range = article.insert(vec![sentence("Z.")], end).unwrap();
        assert_eq!(article.text(), "X.\n\nZ.\n\n");
        assert_eq!(article.section_count(), 2);
        assert_eq!(selected(&article, range), "Z.");
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_insert_at_second_closing_blank_stays_before_blanks() {
        let mut article = article(&[&[&["A."]], &[&["B."]]]);
        // "A.\n\nB.\n\n" with a typed blank line that reconciliation moves
        // to the first section, which then closes with two blanks
        article.store_mut().insert(Position::new(4), "\n").unwrap();
        article.reconcile();
        assert_eq!(article.sections()[0].paragraphs().len(), 3);

        let range = article.insert(vec![sentence("Z.")], Position::new(4)).unwrap();
        assert_eq!(article.text(), "A.\nZ.\n\n\nB.\n\n");
        assert_eq!(selected(&article, range), "Z.");
        assert_eq!(article.sections()[0].content_len(), 2);
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_insert_into_empty_article() {
        let mut article = Article::new(&ArticleData::default()).unwrap();
        let range = article
            .insert(vec![RunElement::Paragraph(ParagraphData::new(vec![SentenceData::text("Hi.")]))], Position::zero())
            .unwrap();
        assert_eq!(article.text(), "Hi.\n\n");
        assert_eq!(selected(&article, range), "Hi.");
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_whole_paragraphs_between_paragraphs() {
        let mut article = article(&[&[&["X."], &["Y."]]]);
        let run = vec![
            RunElement::Paragraph(ParagraphData::new(vec![SentenceData::text("A.")])),
            RunElement::Paragraph(ParagraphData::new(vec![SentenceData::text("B.")])),
        ];
        // "X.\nY.\n\n": at the start of "Y."
        let range = article.insert(run, Position::new(3)).unwrap();
        assert_eq!(article.text(), "X.\nA.\nB.\nY.\n\n");
        assert_eq!(selected(&article, range), "A.\nB.\n");
        assert_eq!(article.sections()[0].content_len(), 4);
        assert!(article.validate().is_clean());
    }

    #[test]
    fn test_picture_sentence_uses_placeholder() {
        let mut article = article(&[&[&["X."]]]);
        let picture = RunElement::Picture(SentenceData::picture(ImageRef::new("map.png")));
        article.insert(vec![picture], Position::zero()).unwrap();
        assert_eq!(article.text(), "\u{FFFC}X.\n\n");
        let data = article.extract().unwrap();
        assert!(data.sections[0].paragraphs[0].sentences[0].is_picture());
    }

    #[test]
    fn test_empty_run_is_a_no_op() {
        let mut article = article(&[&[&["X."]]]);
        let marks = article.store().mark_count();
        let range = article.insert(Vec::new(), Position::new(1)).unwrap();
        assert!(range.is_empty());
        let range = article
            .insert(vec![RunElement::sentence_sentinel()], Position::new(1))
            .unwrap();
        assert!(range.is_empty());
        assert_eq!(article.text(), "X.\n\n");
        assert_eq!(article.store().mark_count(), marks);
    }

    #[test]
    fn test_insert_beyond_end_is_rejected() {
        let mut article = article(&[&[&["X."]]]);
        assert!(matches!(
            article.insert(vec![sentence("A.")], Position::new(9)),
            Err(EditError::InvalidTarget(_))
        ));
    }
}
