//! Sentence node - the leaf of the hierarchy and the only owner of marks

use crate::{ImageRef, Result, SentenceContent, SentenceData, Span, StructureConfig};
use text_store::{Gravity, MarkId, Position, TextStore};

/// A sentence bound to a text store by its start mark.
///
/// The sentence's text runs from its mark to the start of the following
/// sentence. Separator sentences hold only the configured separator and
/// carry no source information.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    pub id: u32,
    pub source_article_id: Option<u32>,
    pub source_section_id: Option<u32>,
    pub source_paragraph_id: Option<u32>,
    pub source_sentence_id: Option<u32>,
    pub order_id: Option<u32>,
    /// Image shown in place of this sentence's placeholder character
    pub picture: Option<ImageRef>,
    mark: MarkId,
}

impl Sentence {
    /// Bind a sentence without source information to an existing mark
    pub fn from_mark(mark: MarkId) -> Self {
        Self {
            id: 0,
            source_article_id: None,
            source_section_id: None,
            source_paragraph_id: None,
            source_sentence_id: None,
            order_id: None,
            picture: None,
            mark,
        }
    }

    /// Insert a sentence's layout text at `at` and bind a new sentence to it.
    ///
    /// Marks of other nodes sitting exactly at `at` stay in front of the new
    /// text; moving them behind it is the caller's job.
    pub fn insert<S: TextStore>(
        store: &mut S,
        data: &SentenceData,
        at: Position,
        config: &StructureConfig,
    ) -> Result<Self> {
        store.insert(at, &data.layout_text(config))?;
        let mark = store.create_mark(at, Gravity::Left)?;
        let mut sentence = Self::from_mark(mark);
        sentence.adopt(data);
        Ok(sentence)
    }

    /// Insert a separator at `at` and bind a separator sentence to it
    pub fn insert_separator<S: TextStore>(
        store: &mut S,
        at: Position,
        config: &StructureConfig,
    ) -> Result<Self> {
        store.insert(at, &config.separator.to_string())?;
        let mark = store.create_mark(at, Gravity::Left)?;
        Ok(Self::from_mark(mark))
    }

    /// Take over the metadata of a snapshot sentence
    fn adopt(&mut self, data: &SentenceData) {
        self.id = data.id;
        self.source_article_id = data.source_article_id;
        self.source_section_id = data.source_section_id;
        self.source_paragraph_id = data.source_paragraph_id;
        self.source_sentence_id = data.source_sentence_id;
        self.order_id = data.order_id;
        self.picture = match &data.content {
            SentenceContent::Picture(image) => Some(image.clone()),
            SentenceContent::Text(_) => None,
        };
    }

    /// Copy this sentence's metadata onto another mark
    pub fn with_metadata_of(mark: MarkId, other: &Sentence) -> Self {
        Self {
            mark,
            ..other.clone()
        }
    }

    pub fn mark(&self) -> MarkId {
        self.mark
    }

    pub fn is_picture(&self) -> bool {
        self.picture.is_some()
    }

    /// Current text, given where the sentence ends
    pub fn text<S: TextStore>(&self, store: &S, end: Position) -> Result<String> {
        let start = self.start(store)?;
        Ok(store.slice(start, end.max(start))?)
    }

    /// Snapshot of this sentence, given where it ends
    pub fn to_data<S: TextStore>(&self, store: &S, end: Position) -> Result<SentenceData> {
        let content = match &self.picture {
            Some(image) => SentenceContent::Picture(image.clone()),
            None => SentenceContent::Text(self.text(store, end)?),
        };
        Ok(SentenceData {
            id: self.id,
            source_article_id: self.source_article_id,
            source_section_id: self.source_section_id,
            source_paragraph_id: self.source_paragraph_id,
            source_sentence_id: self.source_sentence_id,
            order_id: self.order_id,
            content,
        })
    }

    /// Snapshot of the part of this sentence inside `[from, to)`.
    ///
    /// Pictures are indivisible and come out whole.
    pub fn to_data_clipped<S: TextStore>(
        &self,
        store: &S,
        end: Position,
        from: Position,
        to: Position,
    ) -> Result<SentenceData> {
        let mut data = self.to_data(store, end)?;
        if self.picture.is_none() {
            let start = self.start(store)?.max(from);
            let stop = end.min(to).max(start);
            data.content = SentenceContent::Text(store.slice(start, stop)?);
        }
        Ok(data)
    }

    /// Unregister this sentence's mark
    pub fn release<S: TextStore>(self, store: &mut S) -> Result<()> {
        store.delete_mark(self.mark)?;
        Ok(())
    }
}

impl Span for Sentence {
    fn start<S: TextStore>(&self, store: &S) -> Result<Position> {
        Ok(store.mark_position(self.mark)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_store::TextBuffer;

    #[test]
    fn test_insert_binds_mark_and_metadata() {
        let mut store = TextBuffer::from_text("AB");
        let config = StructureConfig::default();
        let mut data = SentenceData::text("xyz");
        data.order_id = Some(4);
        let sentence = Sentence::insert(&mut store, &data, Position::new(1), &config).unwrap();
        assert_eq!(store.text(), "AxyzB");
        assert_eq!(sentence.start(&store).unwrap(), Position::new(1));
        assert_eq!(sentence.order_id, Some(4));
        assert_eq!(sentence.text(&store, Position::new(4)).unwrap(), "xyz");
    }

    #[test]
    fn test_picture_round_trips_through_placeholder() {
        let mut store = TextBuffer::new();
        let config = StructureConfig::default();
        let data = SentenceData::picture(ImageRef::new("map.png"));
        let sentence = Sentence::insert(&mut store, &data, Position::zero(), &config).unwrap();
        assert_eq!(store.text(), "\u{FFFC}");
        assert_eq!(sentence.to_data(&store, store.end()).unwrap(), data);
    }

    #[test]
    fn test_clipped_data_keeps_covered_text() {
        let mut store = TextBuffer::new();
        let config = StructureConfig::default();
        let sentence =
            Sentence::insert(&mut store, &SentenceData::text("Hello world."), Position::zero(), &config)
                .unwrap();
        let data = sentence
            .to_data_clipped(&store, store.end(), Position::new(6), Position::new(40))
            .unwrap();
        assert_eq!(data.content, SentenceContent::Text("world.".into()));
    }

    #[test]
    fn test_release_unregisters_mark() {
        let mut store = TextBuffer::new();
        let config = StructureConfig::default();
        let sentence = Sentence::insert_separator(&mut store, Position::zero(), &config).unwrap();
        assert_eq!(store.mark_count(), 1);
        sentence.release(&mut store).unwrap();
        assert_eq!(store.mark_count(), 0);
    }
}
