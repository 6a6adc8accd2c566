//! Article-level reconciliation
//!
//! Free-form edits can delete the blank line between two sections, collapse
//! a section onto its successor, or leave typed text outside any section.
//! This pass decides which sections survive, folds sections that lost their
//! terminator into the next one, and hands every surviving section to
//! [`Section::reconcile`] to regroup its own paragraphs and sentences.

use crate::{Article, Result};
use doc_model::{
    IntegrityIssue, IntegrityReport, Paragraph, Regrouped, Section, Sentence, Span,
};
use std::collections::VecDeque;
use text_store::{Gravity, TextStore};

impl<S: TextStore> Article<S> {
    /// Re-derive a consistent hierarchy from the current text.
    ///
    /// Never fails. Every repair, and every fault the pass worked around, is
    /// recorded in the returned report.
    pub fn reconcile(&mut self) -> IntegrityReport {
        let mut report = IntegrityReport::new();

        let mut pending: VecDeque<Section> = std::mem::take(&mut self.sections)
            .into_iter()
            .filter(|section| !section.is_empty())
            .collect();
        let mut output = Vec::with_capacity(pending.len());
        if let Err(err) = self.regroup_sections(&mut pending, &mut output, &mut report) {
            report.push(IntegrityIssue::Unrecoverable {
                message: err.to_string(),
            });
        }
        output.extend(pending);
        self.sections = output;

        if let Err(err) = self.prune(&mut report) {
            report.push(IntegrityIssue::Unrecoverable {
                message: err.to_string(),
            });
        }
        if let Err(err) = self.reset_dummies() {
            report.push(IntegrityIssue::Unrecoverable {
                message: err.to_string(),
            });
        }
        self.generate_ids();

        if !report.is_clean() {
            tracing::debug!(
                "reconciled article {}: {} issues, {} sections",
                self.id,
                report.len(),
                self.sections.len()
            );
        }
        report
    }

    /// Section-level pass, moving sections from `pending` to `output`
    fn regroup_sections(
        &mut self,
        pending: &mut VecDeque<Section>,
        output: &mut Vec<Section>,
        report: &mut IntegrityReport,
    ) -> Result<()> {
        if pending.is_empty() && !self.store.is_empty() {
            let start = self.store.start();
            let mark = self.store.create_mark(start, Gravity::Left)?;
            let paragraph = Paragraph::from_sentences(vec![Sentence::from_mark(mark)])?;
            pending.push_back(Section::from_paragraphs(vec![paragraph], None, None));
            report.push(IntegrityIssue::SectionCreated);
        }

        let terminator = self.config.section_terminator();
        let mut carried: Vec<Paragraph> = Vec::new();
        while let Some(mut section) = pending.pop_front() {
            if !carried.is_empty() {
                section.prepend_paragraphs(std::mem::take(&mut carried));
            }
            let start = section.start(&self.store)?;
            let next_start = match pending.front() {
                Some(next) => Some(next.start(&self.store)?),
                None => None,
            };
            let mut end = next_start.unwrap_or_else(|| self.store.end());

            if start >= end {
                report.push(IntegrityIssue::SectionDiscarded {
                    offset: start.offset(),
                });
                section.release(&mut self.store)?;
                continue;
            }

            let text = self.store.slice(start, end)?;
            if !text.ends_with(terminator.as_str()) {
                if next_start.is_some() {
                    report.push(IntegrityIssue::SectionsMerged {
                        offset: start.offset(),
                    });
                    carried = section.into_paragraphs();
                    continue;
                }
                let appended = if text.ends_with(self.config.separator) { 1 } else { 2 };
                let fill: String = std::iter::repeat(self.config.separator).take(appended).collect();
                self.store.insert(end, &fill)?;
                end = self.store.end();
                report.push(IntegrityIssue::SectionTerminated { appended });
            }

            let Regrouped {
                leading_blanks,
                sections,
            } = match section.reconcile(&mut self.store, end, &self.config, report) {
                Ok(regrouped) => regrouped,
                Err(err) => {
                    report.push(IntegrityIssue::Unrecoverable {
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            if let Some(first) = leading_blanks.first() {
                let offset = first.start(&self.store)?;
                let count = leading_blanks.len();
                match output.last_mut() {
                    Some(previous) => {
                        previous.append_paragraphs(leading_blanks);
                        report.push(IntegrityIssue::LeadingBlanksMoved {
                            offset: offset.offset(),
                            count,
                        });
                    }
                    None => {
                        // each blank is a lone separator
                        self.store.delete(offset, offset.forward(count))?;
                        for blank in leading_blanks {
                            blank.release(&mut self.store)?;
                        }
                        report.push(IntegrityIssue::LeadingBlanksRemoved { count });
                    }
                }
            }
            output.extend(sections);
        }
        Ok(())
    }

    /// Drop sentences left without text, then paragraphs and sections left
    /// without content
    fn prune(&mut self, report: &mut IntegrityReport) -> Result<()> {
        let mut index = 0;
        while index < self.sections.len() {
            let end = self.section_end(index)?;
            let spans = self.sections[index].spans(&self.store, end)?;
            let mut cuts = Vec::new();
            let mut released = Vec::new();

            let section = &mut self.sections[index];
            for number in (0..spans.len()).rev() {
                let span = &spans[number];
                let paragraph = &mut section.paragraphs_mut()[number];
                let content_len = paragraph.content_len();
                let degenerate: Vec<usize> = span.sentences[..content_len]
                    .iter()
                    .enumerate()
                    .filter(|(_, range)| range.is_empty())
                    .map(|(position, _)| position)
                    .collect();
                if degenerate.is_empty() {
                    continue;
                }
                for position in &degenerate {
                    report.push(IntegrityIssue::DegenerateSentence {
                        offset: span.sentences[*position].start.offset(),
                    });
                }
                released.extend(paragraph.take_content(|position| !degenerate.contains(&position)));
                if !paragraph.is_blank() {
                    continue;
                }
                if let Some(emptied) = section.remove_paragraph(number) {
                    cuts.push(span.range);
                    released.extend(emptied.into_sentences());
                    report.push(IntegrityIssue::EmptyParagraphPruned { section: index });
                }
            }

            // cuts were collected back to front
            for cut in cuts {
                self.store.delete(cut.start, cut.end)?;
            }
            for sentence in released {
                sentence.release(&mut self.store)?;
            }

            if self.sections[index].has_content() {
                index += 1;
            } else {
                report.push(IntegrityIssue::EmptySectionPruned { section: index });
                self.remove_section_at(index)?;
            }
        }
        Ok(())
    }
}
