//! Multi-select state for bulk actions

use crate::core::record::Record;
use indexmap::IndexSet;

/// Ids selected in a collection view, in selection order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: IndexSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the selection state of one id; returns the new state
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.shift_remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// Select every given id, or clear when all of them are already selected
    ///
    /// Callers pass the visible ids for "select page" behavior, or the whole
    /// filtered set to select across pages. An empty input changes nothing.
    pub fn select_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<S> = ids.into_iter().collect();
        if ids.is_empty() {
            return;
        }

        if ids.iter().all(|id| self.ids.contains(id.as_ref())) {
            self.clear();
        } else {
            for id in ids {
                self.ids.insert(id.as_ref().to_string());
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Drop ids that are no longer part of the collection
    pub fn retain<'a, I>(&mut self, present: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: std::collections::HashSet<&str> = present.into_iter().collect();
        self.ids.retain(|id| present.contains(id.as_str()));
    }

    /// Selected records among `items`, in `items` order
    pub fn selected<'a, R: Record>(&self, items: &'a [R]) -> Vec<&'a R> {
        items.iter().filter(|i| self.is_selected(i.id())).collect()
    }

    /// Sum `accumulator` over the selected records among `items`
    pub fn aggregate<R, F>(&self, items: &[R], accumulator: F) -> f64
    where
        R: Record,
        F: Fn(&R) -> f64,
    {
        items
            .iter()
            .filter(|i| self.is_selected(i.id()))
            .map(accumulator)
            .sum()
    }
}
