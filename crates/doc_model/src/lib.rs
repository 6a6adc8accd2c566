//! Document Model - articles as sections, paragraphs and sentences
//!
//! This crate provides the store-independent snapshot trees an article is
//! built from and extracted to, and the node types that bind those trees to
//! ranges of a [`text_store::TextStore`]. Sentences own the marks; every
//! container derives its range from the sentences it holds.

mod config;
mod error;
mod integrity;
mod locate;
mod paragraph;
mod section;
mod sentence;
mod snapshot;

pub use config::*;
pub use error::*;
pub use integrity::*;
pub use locate::*;
pub use paragraph::*;
pub use section::*;
pub use sentence::*;
pub use snapshot::*;
