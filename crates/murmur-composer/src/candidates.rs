//! Keyboard-navigable candidate lists.
//!
//! A list is rebuilt from scratch for every new query and its cursor starts
//! at 0. Each rebuild takes a [`QueryTicket`]; results carrying an older
//! ticket are dropped, so a slow lookup never overwrites a newer query.

use std::fmt::Display;

use serde::Serialize;

/// Identifies one query against a candidate source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate<T> {
    #[serde(flatten)]
    pub item: T,
    pub selected: bool,
}

/// What the popup renders: every item plus which one is highlighted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateView<T> {
    pub items: Vec<Candidate<T>>,
    pub selected_index: usize,
}

#[derive(Debug)]
pub struct CandidateList<T> {
    items: Vec<T>,
    selected: usize,
    query: Option<String>,
    generation: u64,
}

impl<T> Default for CandidateList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            query: None,
            generation: 0,
        }
    }
}

impl<T: Clone> CandidateList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new query; results for earlier tickets are ignored from now on.
    pub fn begin(&mut self, query: &str) -> QueryTicket {
        self.generation += 1;
        self.query = Some(query.to_string());
        QueryTicket(self.generation)
    }

    /// Install results for `ticket`. A failed lookup yields an empty list.
    /// Returns false when the ticket is stale.
    pub fn complete<E: Display>(&mut self, ticket: QueryTicket, result: Result<Vec<T>, E>) -> bool {
        if ticket.0 != self.generation {
            tracing::trace!(ticket = ticket.0, current = self.generation, "stale lookup dropped");
            return false;
        }
        self.items = match result {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(query = ?self.query, error = %e, "candidate lookup failed");
                Vec::new()
            }
        };
        self.selected = 0;
        true
    }

    /// Drop the list and invalidate any lookup in flight.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.items.clear();
        self.selected = 0;
        self.query = None;
    }

    /// Move the cursor with wrap-around. No-op on an empty list.
    pub fn navigate(&mut self, direction: Direction) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        self.selected = match direction {
            Direction::Down => (self.selected + 1) % len,
            Direction::Up => (self.selected + len - 1) % len,
        };
    }

    /// Point the cursor at `index`. Returns false when out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.selected = index;
        true
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn view(&self) -> CandidateView<T> {
        CandidateView {
            items: self
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| Candidate {
                    item: item.clone(),
                    selected: i == self.selected,
                })
                .collect(),
            selected_index: self.selected,
        }
    }
}
