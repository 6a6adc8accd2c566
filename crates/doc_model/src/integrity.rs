//! Integrity reporting
//!
//! Reconciliation repairs structure in place and records every repair as an
//! [`IntegrityIssue`]; validation records the invariant violations it finds
//! without repairing anything.

use serde::{Deserialize, Serialize};

/// Collected findings of one reconciliation or validation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Issues in the order they were found
    pub issues: Vec<IntegrityIssue>,
}

/// Things reconciliation repaired or validation found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IntegrityIssue {
    /// A sentence's whole text was deleted
    DegenerateSentence { offset: usize },
    /// A sentence contained separators and was cut into pieces
    SentenceCut { offset: usize, pieces: usize },
    /// A picture sentence lost its placeholder character
    PictureLost { offset: usize },
    /// A section's start collapsed onto the next section's start
    SectionDiscarded { offset: usize },
    /// The blank line between two sections was deleted
    SectionsMerged { offset: usize },
    /// The last section lacked its closing separators
    SectionTerminated { appended: usize },
    /// Blank lines typed inside a section split it into several
    SectionRegrouped { offset: usize, sections: usize },
    /// Blank paragraphs opening a section were handed to the previous one
    LeadingBlanksMoved { offset: usize, count: usize },
    /// Blank paragraphs opening the document were removed
    LeadingBlanksRemoved { count: usize },
    /// Text typed into an article without sections became a section
    SectionCreated,
    /// A paragraph had no sentences left
    EmptyParagraphPruned { section: usize },
    /// A section had no paragraphs left
    EmptySectionPruned { section: usize },

    /// A section does not end with a blank paragraph
    UnterminatedSection { section: usize },
    /// A section has no content paragraph
    EmptySection { section: usize },
    /// A blank paragraph sits before a content paragraph
    MisplacedBlank { section: usize, paragraph: usize },
    /// A paragraph does not end with exactly one separator
    MissingSeparator { section: usize, paragraph: usize },
    /// A content sentence is empty or contains a separator
    MalformedSentence {
        section: usize,
        paragraph: usize,
        sentence: usize,
    },
    /// Sibling starts are not strictly increasing
    OutOfOrder { offset: usize },
    /// A dummy section is not pinned to its end of the document
    DummyMisplaced { offset: usize },
    /// The store holds marks no node accounts for, or lacks some. Marks
    /// held by the store's other users count too, so this alone does not
    /// make the hierarchy inconsistent.
    MarkMismatch { expected: usize, actual: usize },

    /// A repair step failed; the pass continued best-effort
    Unrecoverable { message: String },
}

/// Severity levels for integrity issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueSeverity {
    /// Routine repair of an ordinary edit
    Info,
    /// Repair that changed grouping the user may care about
    Warning,
    /// Invariant violation
    Error,
    /// Structure may be unusable
    Critical,
}

impl IntegrityIssue {
    pub fn severity(&self) -> IssueSeverity {
        match self {
            IntegrityIssue::DegenerateSentence { .. }
            | IntegrityIssue::SentenceCut { .. }
            | IntegrityIssue::SectionTerminated { .. }
            | IntegrityIssue::EmptyParagraphPruned { .. }
            | IntegrityIssue::LeadingBlanksRemoved { .. } => IssueSeverity::Info,
            IntegrityIssue::PictureLost { .. }
            | IntegrityIssue::SectionDiscarded { .. }
            | IntegrityIssue::SectionsMerged { .. }
            | IntegrityIssue::SectionRegrouped { .. }
            | IntegrityIssue::LeadingBlanksMoved { .. }
            | IntegrityIssue::SectionCreated
            | IntegrityIssue::EmptySectionPruned { .. }
            | IntegrityIssue::MarkMismatch { .. } => IssueSeverity::Warning,
            IntegrityIssue::UnterminatedSection { .. }
            | IntegrityIssue::EmptySection { .. }
            | IntegrityIssue::MisplacedBlank { .. }
            | IntegrityIssue::MissingSeparator { .. }
            | IntegrityIssue::MalformedSentence { .. }
            | IntegrityIssue::OutOfOrder { .. }
            | IntegrityIssue::DummyMisplaced { .. } => IssueSeverity::Error,
            IntegrityIssue::Unrecoverable { .. } => IssueSeverity::Critical,
        }
    }
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::DegenerateSentence { offset } => {
                write!(f, "removed empty sentence at {}", offset)
            }
            IntegrityIssue::SentenceCut { offset, pieces } => {
                write!(f, "cut sentence at {} into {} pieces", offset, pieces)
            }
            IntegrityIssue::PictureLost { offset } => {
                write!(f, "picture at {} lost its placeholder", offset)
            }
            IntegrityIssue::SectionDiscarded { offset } => {
                write!(f, "discarded collapsed section at {}", offset)
            }
            IntegrityIssue::SectionsMerged { offset } => {
                write!(f, "merged section at {} into the next one", offset)
            }
            IntegrityIssue::SectionTerminated { appended } => {
                write!(f, "appended {} separators to the last section", appended)
            }
            IntegrityIssue::SectionRegrouped { offset, sections } => {
                write!(f, "section at {} regrouped into {} sections", offset, sections)
            }
            IntegrityIssue::LeadingBlanksMoved { offset, count } => {
                write!(f, "moved {} leading blank paragraphs at {}", count, offset)
            }
            IntegrityIssue::LeadingBlanksRemoved { count } => {
                write!(f, "removed {} blank paragraphs opening the document", count)
            }
            IntegrityIssue::SectionCreated => write!(f, "created a section for unstructured text"),
            IntegrityIssue::EmptyParagraphPruned { section } => {
                write!(f, "pruned empty paragraph in section {}", section)
            }
            IntegrityIssue::EmptySectionPruned { section } => {
                write!(f, "pruned empty section {}", section)
            }
            IntegrityIssue::UnterminatedSection { section } => {
                write!(f, "section {} is not terminated by a blank paragraph", section)
            }
            IntegrityIssue::EmptySection { section } => {
                write!(f, "section {} has no content", section)
            }
            IntegrityIssue::MisplacedBlank { section, paragraph } => {
                write!(f, "blank paragraph {} of section {} precedes content", paragraph, section)
            }
            IntegrityIssue::MissingSeparator { section, paragraph } => {
                write!(f, "paragraph {} of section {} has no separator", paragraph, section)
            }
            IntegrityIssue::MalformedSentence {
                section,
                paragraph,
                sentence,
            } => write!(
                f,
                "sentence {} of paragraph {} in section {} is malformed",
                sentence, paragraph, section
            ),
            IntegrityIssue::OutOfOrder { offset } => write!(f, "node out of order at {}", offset),
            IntegrityIssue::DummyMisplaced { offset } => {
                write!(f, "dummy section misplaced at {}", offset)
            }
            IntegrityIssue::MarkMismatch { expected, actual } => {
                write!(f, "expected {} marks, store holds {}", expected, actual)
            }
            IntegrityIssue::Unrecoverable { message } => write!(f, "unrecoverable: {}", message),
        }
    }
}

impl IntegrityReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue and log it at a level matching its severity
    pub fn push(&mut self, issue: IntegrityIssue) {
        match issue.severity() {
            IssueSeverity::Info => tracing::debug!("integrity: {}", issue),
            IssueSeverity::Warning => tracing::warn!("integrity: {}", issue),
            IssueSeverity::Error | IssueSeverity::Critical => {
                tracing::error!("integrity: {}", issue)
            }
        }
        self.issues.push(issue);
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Whether any issue is an invariant violation or worse
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity() >= IssueSeverity::Error)
    }

    /// The most severe issue found, if any
    pub fn worst(&self) -> Option<&IntegrityIssue> {
        self.issues.iter().max_by_key(|issue| issue.severity())
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Append another report's issues
    pub fn merge(&mut self, other: IntegrityReport) {
        self.issues.extend(other.issues);
    }
}
