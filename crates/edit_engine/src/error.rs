//! Error types for editing operations

use text_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Text store already holds {0} characters")]
    StoreNotEmpty(usize),

    #[error("No drag selection remembered")]
    NoDragSelection,

    #[error("Structural inconsistency: {0}")]
    StructuralInconsistency(String),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    #[error("Text store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, EditError>;
