//! Error types for document model operations

use text_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocModelError {
    #[error("Text store error: {0}")]
    Store(#[from] StoreError),

    #[error("Empty node: {0}")]
    EmptyNode(String),

    #[error("Unterminated section at offset {0}")]
    UnterminatedSection(usize),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DocModelError>;
