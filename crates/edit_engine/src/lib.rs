//! Edit Engine - articles bound to a text store
//!
//! An [`Article`] keeps a section/paragraph/sentence hierarchy in step with
//! the text it was laid out into. Structured operations edit both together;
//! free-form edits go straight to the store and are folded back into the
//! hierarchy by reconciliation.

mod article;
mod deletion;
mod error;
mod insertion;
mod reconcile;
mod selection;

pub use article::*;
pub use error::*;
