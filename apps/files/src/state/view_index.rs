use std::collections::{BTreeSet, HashSet};

use crate::table::sort_filter::ViewQuery;

/// Identifies one first-page fetch and every later page fetched on top of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub query: ViewQuery,
    pub generation: u64,
}

/// The ordered ids currently shown, and the fetch they came from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewIndex {
    pub ordered_ids: Vec<String>,
    pub total_count: usize,
    pub query: ViewQuery,
    /// Bumped on every reset, so a repeated query still tells fetches apart.
    pub generation: u64,
    pub loaded_pages: BTreeSet<usize>,
}

impl ViewIndex {
    pub fn ticket(&self) -> FetchTicket {
        FetchTicket {
            query: self.query.clone(),
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.generation == ticket.generation && self.query == ticket.query
    }

    pub fn has_query(&self, query: &ViewQuery) -> bool {
        &self.query == query
    }

    pub fn has_page(&self, page_number: usize) -> bool {
        self.loaded_pages.contains(&page_number)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ordered_ids.iter().any(|existing| existing == id)
    }

    pub fn len(&self) -> usize {
        self.ordered_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_ids.is_empty()
    }

    /// Starts a new projection; earlier rows no longer apply.
    pub(crate) fn reset(&mut self, query: ViewQuery) -> FetchTicket {
        self.ordered_ids.clear();
        self.total_count = 0;
        self.loaded_pages.clear();
        self.query = query;
        self.generation += 1;
        self.ticket()
    }

    pub(crate) fn replace(&mut self, ids: Vec<String>, total_count: usize) {
        self.ordered_ids = dedup_preserving_order(ids);
        self.total_count = total_count;
        self.loaded_pages.insert(0);
    }

    /// Appends a later page. Ids already present keep their position.
    pub(crate) fn append(&mut self, page_number: usize, ids: impl IntoIterator<Item = String>) {
        self.loaded_pages.insert(page_number);
        let mut seen: HashSet<String> = self.ordered_ids.iter().cloned().collect();
        for id in ids {
            if seen.insert(id.clone()) {
                self.ordered_ids.push(id);
            }
        }
    }

    pub(crate) fn set_order(&mut self, ids: Vec<String>) {
        self.ordered_ids = dedup_preserving_order(ids);
    }

    pub(crate) fn prepend(&mut self, id: String) {
        if !self.contains(&id) {
            self.ordered_ids.insert(0, id);
            self.total_count += 1;
        }
    }

    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let before = self.ordered_ids.len();
        self.ordered_ids.retain(|existing| existing != id);
        let removed = self.ordered_ids.len() != before;
        if removed {
            self.total_count = self.total_count.saturating_sub(1);
        }
        removed
    }

    pub(crate) fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.ordered_ids.retain(|id| keep(id));
    }
}

fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::sort_filter::{TableFilter, TYPE_FILTER_COLUMN};

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn append_skips_ids_already_shown() {
        let mut view = ViewIndex::default();
        view.replace(ids(&["a", "b"]), 4);
        view.append(1, ids(&["b", "c", "d", "c"]));
        assert_eq!(view.ordered_ids, ids(&["a", "b", "c", "d"]));
        assert_eq!(view.total_count, 4);
        assert!(view.has_page(0) && view.has_page(1));
    }

    #[test]
    fn reset_clears_rows_and_switches_query() {
        let mut view = ViewIndex::default();
        view.replace(ids(&["a"]), 1);
        let query = ViewQuery::new(
            "displayName,asc",
            &[TableFilter::choices(TYPE_FILTER_COLUMN, ["image"])],
        );
        let ticket = view.reset(query.clone());
        assert!(view.is_empty());
        assert!(!view.has_page(0));
        assert!(view.is_current(&ticket));
        assert!(view.has_query(&query));
        assert!(!view.has_query(&ViewQuery::default()));
    }

    #[test]
    fn repeated_query_gets_a_new_generation() {
        let mut view = ViewIndex::default();
        let first = view.reset(ViewQuery::default());
        let second = view.reset(ViewQuery::default());
        assert_eq!(first.query, second.query);
        assert!(!view.is_current(&first));
        assert!(view.is_current(&second));
    }

    #[test]
    fn prepend_and_remove_track_total() {
        let mut view = ViewIndex::default();
        view.replace(ids(&["a"]), 1);
        view.prepend("z".into());
        view.prepend("z".into());
        assert_eq!(view.ordered_ids, ids(&["z", "a"]));
        assert_eq!(view.total_count, 2);

        assert!(view.remove("a"));
        assert!(!view.remove("a"));
        assert_eq!(view.total_count, 1);
    }

    #[test]
    fn set_order_drops_duplicates() {
        let mut view = ViewIndex::default();
        view.set_order(ids(&["b", "a", "b"]));
        assert_eq!(view.ordered_ids, ids(&["b", "a"]));
    }
}
