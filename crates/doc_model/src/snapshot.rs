//! Store-independent snapshot trees
//!
//! Snapshots are what an importer hands to an article, what an article hands
//! back on extraction, and what a copied or dragged selection is carried as.
//! They hold content only: paragraph separators and blank paragraphs are
//! layout and never appear in a snapshot.

use crate::{Result, StructureConfig};
use serde::{Deserialize, Serialize};

/// Reference to an image embedded in an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Path or URL of the image resource
    pub path: String,
    /// Caption shown with the image
    #[serde(default)]
    pub caption: Option<String>,
}

impl ImageRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            caption: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// What a sentence holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentenceContent {
    Text(String),
    Picture(ImageRef),
}

impl Default for SentenceContent {
    fn default() -> Self {
        SentenceContent::Text(String::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceData {
    /// Position among its paragraph's sentences, 1-based; 0 when unassigned
    pub id: u32,
    #[serde(default)]
    pub source_article_id: Option<u32>,
    #[serde(default)]
    pub source_section_id: Option<u32>,
    #[serde(default)]
    pub source_paragraph_id: Option<u32>,
    #[serde(default)]
    pub source_sentence_id: Option<u32>,
    #[serde(default)]
    pub order_id: Option<u32>,
    pub content: SentenceContent,
}

impl SentenceData {
    /// A text sentence with no source information
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: SentenceContent::Text(text.into()),
            ..Default::default()
        }
    }

    /// A picture sentence with no source information
    pub fn picture(image: ImageRef) -> Self {
        Self {
            content: SentenceContent::Picture(image),
            ..Default::default()
        }
    }

    /// The empty sentence that marks the end of a container's first part in a run
    pub fn sentinel() -> Self {
        Self::default()
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(&self.content, SentenceContent::Text(text) if text.is_empty())
    }

    pub fn is_picture(&self) -> bool {
        matches!(self.content, SentenceContent::Picture(_))
    }

    /// The characters this sentence occupies in a text store
    pub fn layout_text(&self, config: &StructureConfig) -> String {
        match &self.content {
            SentenceContent::Text(text) => text.clone(),
            SentenceContent::Picture(_) => config.picture_placeholder.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphData {
    /// Position among its section's paragraphs, 1-based; 0 when unassigned
    pub id: u32,
    pub sentences: Vec<SentenceData>,
}

impl ParagraphData {
    pub fn new(sentences: Vec<SentenceData>) -> Self {
        Self { id: 0, sentences }
    }

    /// The empty paragraph that marks the end of a section's first part in a run
    pub fn sentinel() -> Self {
        Self::default()
    }

    /// Whether no sentence of this paragraph would occupy any text
    pub fn is_empty(&self) -> bool {
        self.sentences.iter().all(SentenceData::is_sentinel)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionData {
    /// Position among the article's sections, 1-based; 0 when unassigned
    pub id: u32,
    #[serde(default)]
    pub source_article_id: Option<u32>,
    #[serde(default)]
    pub source_section_id: Option<u32>,
    pub paragraphs: Vec<ParagraphData>,
}

impl SectionData {
    pub fn new(paragraphs: Vec<ParagraphData>) -> Self {
        Self {
            paragraphs,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(ParagraphData::is_empty)
    }
}

/// A whole article
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleData {
    pub id: u32,
    #[serde(default)]
    pub source_article_id: Option<u32>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub theme: String,
    pub sections: Vec<SectionData>,
    #[serde(default)]
    pub image_list: Vec<ImageRef>,
}

impl ArticleData {
    pub fn new(title: impl Into<String>, sections: Vec<SectionData>) -> Self {
        Self {
            title: title.into(),
            sections,
            ..Default::default()
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One element of a run: a flattened, mixed-granularity list of content
/// being inserted, copied or dragged.
///
/// A container element inside a run is followed by the rest of the run; an
/// empty `Sentence` or `Paragraph` element is a sentinel marking the end of
/// the first, partially covered container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum RunElement {
    Sentence(SentenceData),
    Picture(SentenceData),
    Paragraph(ParagraphData),
    Section(SectionData),
}

impl RunElement {
    /// Wrap a sentence, choosing the picture variant for picture content
    pub fn from_sentence(data: SentenceData) -> Self {
        if data.is_picture() {
            RunElement::Picture(data)
        } else {
            RunElement::Sentence(data)
        }
    }

    pub fn sentence_sentinel() -> Self {
        RunElement::Sentence(SentenceData::sentinel())
    }

    pub fn paragraph_sentinel() -> Self {
        RunElement::Paragraph(ParagraphData::sentinel())
    }

    /// Whether this element is an empty structural marker
    pub fn is_sentinel(&self) -> bool {
        match self {
            RunElement::Sentence(data) => data.is_sentinel(),
            RunElement::Picture(_) => false,
            RunElement::Paragraph(data) => data.is_empty(),
            RunElement::Section(data) => data.is_empty(),
        }
    }

    /// Short name of the element kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            RunElement::Sentence(_) => "sentence",
            RunElement::Picture(_) => "picture",
            RunElement::Paragraph(_) => "paragraph",
            RunElement::Section(_) => "section",
        }
    }

    /// Concatenated layout text of the element's content
    pub fn layout_text(&self, config: &StructureConfig) -> String {
        match self {
            RunElement::Sentence(data) | RunElement::Picture(data) => data.layout_text(config),
            RunElement::Paragraph(data) => data
                .sentences
                .iter()
                .map(|sentence| sentence.layout_text(config))
                .collect(),
            RunElement::Section(data) => data
                .paragraphs
                .iter()
                .flat_map(|paragraph| paragraph.sentences.iter())
                .map(|sentence| sentence.layout_text(config))
                .collect(),
        }
    }
}
