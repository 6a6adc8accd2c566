//! Text Store - the mutable character sequence behind an article
//!
//! Positions are transient character offsets, valid until the next edit.
//! Marks are stable handles that the store keeps up to date across edits,
//! moving according to their gravity when text is inserted exactly at them.

mod buffer;
mod error;
mod position;
mod store;

pub use buffer::*;
pub use error::*;
pub use position::*;
pub use store::*;
