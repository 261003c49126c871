//! Survey state machine: ordered pages, a forward-only cursor, the selection
//! gate, selection histories and per-page timing samples.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::SurveyError;

use super::page::{Choice, Page, PageKind, PairContent};

/// Selections recorded for completed pair pages, in page order.
///
/// All four lists always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionHistory {
    pub selections: Vec<Choice>,
    pub opposite_selections: Vec<Choice>,
    pub selected_texts: Vec<String>,
    pub opposite_texts: Vec<String>,
}

impl SelectionHistory {
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    fn push(&mut self, choice: Choice, selected: &str, opposite: &str) {
        self.selections.push(choice);
        self.opposite_selections.push(choice.opposite());
        self.selected_texts.push(selected.to_string());
        self.opposite_texts.push(opposite.to_string());
    }
}

/// Result of a successful `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The cursor moved forward by one page.
    Moved { from: usize, to: usize },
    /// `advance` was called on the final page; the session is over.
    Closed,
}

#[derive(Debug, Clone)]
pub struct SurveyState {
    pages: Vec<Page>,
    cursor: usize,
    pending: Option<Choice>,
    history: SelectionHistory,
    /// Pair context of completed training pages, for the profiler.
    pair_context: Vec<String>,
    timings: BTreeMap<usize, Vec<Duration>>,
    closed: bool,
}

impl SurveyState {
    /// Create a state machine over a non-empty page list.
    pub fn new(pages: Vec<Page>) -> Result<Self, SurveyError> {
        if pages.is_empty() {
            return Err(SurveyError::NoPages);
        }
        Ok(Self {
            pages,
            cursor: 0,
            pending: None,
            history: SelectionHistory::default(),
            pair_context: Vec::new(),
            timings: BTreeMap::new(),
            closed: false,
        })
    }

    pub fn current_page(&self) -> &Page {
        &self.pages[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn last_index(&self) -> usize {
        self.pages.len() - 1
    }

    /// The cursor is on the final page.
    pub fn is_terminal(&self) -> bool {
        self.cursor == self.last_index()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn pending_selection(&self) -> Option<Choice> {
        self.pending
    }

    pub fn history(&self) -> &SelectionHistory {
        &self.history
    }

    pub fn pair_context(&self) -> &[String] {
        &self.pair_context
    }

    pub fn timings(&self, page: usize) -> &[Duration] {
        self.timings.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Record a selection on the current page. Selecting again replaces the
    /// earlier choice; every selection adds a timing sample.
    pub fn select(&mut self, choice: Choice, elapsed: Duration) -> Result<(), SurveyError> {
        self.ensure_open()?;
        let page = self.current_page();
        if !page.requires_selection() {
            return Err(SurveyError::NotSelectable { page: page.index });
        }
        if page.is_awaiting_content() {
            return Err(SurveyError::ContentPending { page: page.index });
        }
        self.pending = Some(choice);
        self.timings.entry(self.cursor).or_default().push(elapsed);
        Ok(())
    }

    /// Leave the current page.
    ///
    /// Pair pages need a recorded selection; without one the cursor stays
    /// put and `SelectionRequired` is returned. On the final page the survey
    /// closes instead of moving.
    pub fn advance(&mut self, elapsed: Duration) -> Result<Advance, SurveyError> {
        self.ensure_open()?;
        let page = &self.pages[self.cursor];

        if page.is_awaiting_content() {
            return Err(SurveyError::ContentPending { page: page.index });
        }

        if page.requires_selection() {
            let choice = self
                .pending
                .ok_or(SurveyError::SelectionRequired { page: page.index })?;
            // requires_selection + content present => both texts exist
            let (selected, opposite) = match (
                page.option_text(choice),
                page.option_text(choice.opposite()),
            ) {
                (Some(s), Some(o)) => (s.to_string(), o.to_string()),
                _ => return Err(SurveyError::ContentPending { page: page.index }),
            };
            if matches!(page.kind, PageKind::TrainingPair { .. }) {
                if let Some(ctx) = page.pair_context() {
                    self.pair_context.push(ctx);
                }
            }
            self.history.push(choice, &selected, &opposite);
        }

        self.timings.entry(self.cursor).or_default().push(elapsed);
        self.pending = None;

        if self.is_terminal() {
            self.closed = true;
            return Ok(Advance::Closed);
        }

        let from = self.cursor;
        self.cursor += 1;
        Ok(Advance::Moved {
            from,
            to: self.cursor,
        })
    }

    /// Write generated paragraphs into the page for `interaction`.
    pub fn fill_generated(
        &mut self,
        interaction: usize,
        new_content: PairContent,
    ) -> Result<usize, SurveyError> {
        let page = self
            .pages
            .iter_mut()
            .find(|p| p.interaction() == Some(interaction))
            .ok_or(SurveyError::NotGenerated { page: self.cursor })?;
        if let PageKind::GeneratedPair { content, .. } = &mut page.kind {
            *content = Some(new_content);
        }
        let index = page.index;
        // A refreshed page drops the selection made on the old text.
        if index == self.cursor {
            self.pending = None;
        }
        Ok(index)
    }

    /// Drop generated content from `interaction` onward so those pages wait
    /// for a fresh rewrite.
    pub fn reset_generated_from(&mut self, interaction: usize) {
        for page in &mut self.pages {
            if let PageKind::GeneratedPair {
                interaction: i,
                content,
            } = &mut page.kind
            {
                if *i >= interaction {
                    *content = None;
                    if page.index == self.cursor {
                        self.pending = None;
                    }
                }
            }
        }
    }

    /// Generated pages from `interaction` onward, in order.
    pub fn generated_interactions_from(&self, interaction: usize) -> Vec<usize> {
        self.pages
            .iter()
            .filter_map(Page::interaction)
            .filter(|&i| i >= interaction)
            .collect()
    }

    fn ensure_open(&self) -> Result<(), SurveyError> {
        if self.closed {
            Err(SurveyError::SessionClosed)
        } else {
            Ok(())
        }
    }
}
