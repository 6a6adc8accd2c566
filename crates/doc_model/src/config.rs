//! Structure configuration
//!
//! Controls which characters the article layout uses for structural
//! boundaries and embedded pictures.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default paragraph separator
pub const DEFAULT_SEPARATOR: char = '\n';

/// Default stand-in character for picture sentences (OBJECT REPLACEMENT CHARACTER)
pub const DEFAULT_PICTURE_PLACEHOLDER: char = '\u{FFFC}';

/// Characters used to lay an article out in its text store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Terminates every paragraph; a paragraph holding only this character is blank
    pub separator: char,
    /// The single character a picture sentence occupies
    pub picture_placeholder: char,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            picture_placeholder: DEFAULT_PICTURE_PLACEHOLDER,
        }
    }
}

impl StructureConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a configuration, falling back to defaults on malformed input
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to parse structure config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load a configuration file, or return defaults if it doesn't exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json_or_default(&content))
    }

    /// Text a well-formed section ends with: its last paragraph's separator
    /// followed by one blank paragraph
    pub fn section_terminator(&self) -> String {
        let mut terminator = String::with_capacity(2);
        terminator.push(self.separator);
        terminator.push(self.separator);
        terminator
    }
}
