//! Error types for text store operations

use crate::MarkId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Position {position} is beyond the end of the text (length {len})")]
    PositionOutOfBounds { position: usize, len: usize },

    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: usize, end: usize },

    #[error("Unknown mark: {0}")]
    UnknownMark(MarkId),
}

pub type Result<T> = std::result::Result<T, StoreError>;
