//! Paragraph node - content sentences closed by a separator sentence

use crate::{
    best_gap, ends, insertion_index, starts, DocModelError, ParagraphData, Result, Sentence,
    Span, StructureConfig,
};
use text_store::{Position, TextStore};

/// A paragraph bound to a text store.
///
/// The last sentence is always the paragraph's separator; every sentence
/// before it is content. A paragraph with no content is blank.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub id: u32,
    sentences: Vec<Sentence>,
}

impl Paragraph {
    /// Build a paragraph from sentences whose last one is the separator
    pub fn from_sentences(sentences: Vec<Sentence>) -> Result<Self> {
        if sentences.is_empty() {
            return Err(DocModelError::EmptyNode("paragraph without sentences".into()));
        }
        Ok(Self { id: 0, sentences })
    }

    /// Insert a snapshot paragraph's text at `at`.
    ///
    /// Sentinel sentences are skipped. Returns `None`, leaving the store
    /// untouched, when nothing remains to insert.
    pub fn insert<S: TextStore>(
        store: &mut S,
        data: &ParagraphData,
        at: Position,
        config: &StructureConfig,
    ) -> Result<Option<Self>> {
        if data.is_empty() {
            return Ok(None);
        }
        let mut cursor = at;
        let mut sentences = Vec::with_capacity(data.sentences.len() + 1);
        for sentence in data.sentences.iter().filter(|s| !s.is_sentinel()) {
            let before = store.len();
            sentences.push(Sentence::insert(store, sentence, cursor, config)?);
            cursor = cursor.forward(store.len() - before);
        }
        sentences.push(Sentence::insert_separator(store, cursor, config)?);
        Ok(Some(Self {
            id: data.id,
            sentences,
        }))
    }

    /// Insert a blank paragraph at `at`
    pub fn blank<S: TextStore>(store: &mut S, at: Position, config: &StructureConfig) -> Result<Self> {
        let separator = Sentence::insert_separator(store, at, config)?;
        Ok(Self {
            id: 0,
            sentences: vec![separator],
        })
    }

    /// All sentences, separator last
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn sentences_mut(&mut self) -> &mut [Sentence] {
        &mut self.sentences
    }

    /// Content sentences, without the separator
    pub fn content(&self) -> &[Sentence] {
        &self.sentences[..self.content_len()]
    }

    pub fn content_mut(&mut self) -> &mut [Sentence] {
        let len = self.content_len();
        &mut self.sentences[..len]
    }

    pub fn separator(&self) -> Option<&Sentence> {
        self.sentences.last()
    }

    pub fn content_len(&self) -> usize {
        self.sentences.len().saturating_sub(1)
    }

    pub fn is_blank(&self) -> bool {
        self.content_len() == 0
    }

    pub fn into_sentences(self) -> Vec<Sentence> {
        self.sentences
    }

    /// Add a content sentence; the index is clamped to stay before the separator
    pub fn insert_sentence(&mut self, index: usize, sentence: Sentence) {
        let index = index.min(self.content_len());
        self.sentences.insert(index, sentence);
    }

    /// Remove and return the content sentences `keep` rejects, by content index
    pub fn take_content(&mut self, keep: impl Fn(usize) -> bool) -> Vec<Sentence> {
        let len = self.content_len();
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.sentences.len());
        for (index, sentence) in self.sentences.drain(..).enumerate() {
            if index < len && !keep(index) {
                taken.push(sentence);
            } else {
                kept.push(sentence);
            }
        }
        self.sentences = kept;
        taken
    }

    /// Split in two before content sentence `index`; the first half is
    /// closed by `separator`, the second keeps the original separator
    pub fn split_at(mut self, index: usize, separator: Sentence) -> (Paragraph, Paragraph) {
        let second = self.sentences.split_off(index.min(self.content_len()));
        self.sentences.push(separator);
        (
            self,
            Paragraph {
                id: 0,
                sentences: second,
            },
        )
    }

    /// Current starts of every sentence, separator included
    pub fn sentence_starts<S: TextStore>(&self, store: &S) -> Result<Vec<Position>> {
        starts(&self.sentences, store)
    }

    /// Index of the content-sentence gap nearest `position`, never after the separator
    pub fn best_sentence_gap<S: TextStore>(
        &self,
        store: &S,
        end: Position,
        position: Position,
    ) -> Result<usize> {
        let starts = self.sentence_starts(store)?;
        Ok(best_gap(&starts, end, position).min(self.content_len()))
    }

    /// Index a content sentence inserted at `position` takes
    pub fn sentence_insertion_index<S: TextStore>(&self, store: &S, position: Position) -> Result<usize> {
        let starts = self.sentence_starts(store)?;
        Ok(insertion_index(&starts, position).min(self.content_len()))
    }

    /// Where the sentence gap `index` lies
    pub fn gap_position<S: TextStore>(&self, store: &S, index: usize) -> Result<Position> {
        let index = index.min(self.content_len());
        self.sentences[index].start(store)
    }

    /// Start of this paragraph's separator
    pub fn separator_start<S: TextStore>(&self, store: &S) -> Result<Position> {
        self.gap_position(store, self.content_len())
    }

    /// Snapshot of the content sentences, given where the paragraph ends
    pub fn to_data<S: TextStore>(&self, store: &S, end: Position) -> Result<ParagraphData> {
        let starts = self.sentence_starts(store)?;
        let ends = ends(&starts, end);
        let sentences = self
            .content()
            .iter()
            .zip(ends)
            .map(|(sentence, end)| sentence.to_data(store, end))
            .collect::<Result<Vec<_>>>()?;
        Ok(ParagraphData {
            id: self.id,
            sentences,
        })
    }

    /// Unregister every sentence mark
    pub fn release<S: TextStore>(self, store: &mut S) -> Result<()> {
        for sentence in self.sentences {
            sentence.release(store)?;
        }
        Ok(())
    }
}

impl Span for Paragraph {
    fn start<S: TextStore>(&self, store: &S) -> Result<Position> {
        self.sentences
            .first()
            .ok_or_else(|| DocModelError::EmptyNode("paragraph without sentences".into()))?
            .start(store)
    }
}
