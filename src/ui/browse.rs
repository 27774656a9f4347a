use crate::backend::api::{CATALOG_PAGE_SIZE, CatalogQuery, SortOrder};
use crate::backend::models::Manga;

/// Status values the upstream uses, paired with the label shown for each.
pub const STATUS_FILTERS: [(&str, &str); 3] = [
    ("Em Lançamento", "Ongoing"),
    ("Completo", "Completed"),
    ("Pausado", "Paused"),
];

/// Search, sort, page and filter state of the catalog grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseState {
    pub search_draft: String,
    pub active_search: String,
    pub current_page: u32,
    pub sort_order: SortOrder,
    pub status_filter: Option<String>,
}

impl BrowseState {
    pub fn from_query(query: &str) -> Self {
        let mut state = Self::default();
        state.sync_from_query(query);
        state
    }

    pub fn query(&self) -> CatalogQuery {
        if self.active_search.is_empty() {
            CatalogQuery::List {
                page: self.current_page,
                size: CATALOG_PAGE_SIZE,
                sort: self.sort_order,
            }
        } else {
            CatalogQuery::Search {
                title: self.active_search.clone(),
                page: self.current_page,
                size: CATALOG_PAGE_SIZE,
            }
        }
    }

    pub fn submit_search(&mut self) {
        self.active_search = self.search_draft.clone();
        self.current_page = 0;
    }

    pub fn set_page(&mut self, page: u32) {
        self.current_page = page;
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort_order = sort;
        self.current_page = 0;
    }

    /// Cycles none -> each known status -> none. Does not touch the upstream query.
    pub fn cycle_status_filter(&mut self) {
        let idx = self
            .status_filter
            .as_deref()
            .and_then(|s| STATUS_FILTERS.iter().position(|(value, _)| *value == s));
        self.status_filter = match idx {
            None => Some(STATUS_FILTERS[0].0.to_string()),
            Some(i) if i + 1 < STATUS_FILTERS.len() => Some(STATUS_FILTERS[i + 1].0.to_string()),
            Some(_) => None,
        };
    }

    pub fn status_label(&self) -> &str {
        match self.status_filter.as_deref() {
            None => "All",
            Some(value) => STATUS_FILTERS
                .iter()
                .find(|(v, _)| *v == value)
                .map(|(_, label)| *label)
                .unwrap_or(value),
        }
    }

    /// Narrows an already fetched page. Totals reported by the server are left alone.
    pub fn apply_filter<'a>(&self, content: &'a [Manga]) -> Vec<&'a Manga> {
        match &self.status_filter {
            None => content.iter().collect(),
            Some(status) => content
                .iter()
                .filter(|m| m.status.as_deref() == Some(status.as_str()))
                .collect(),
        }
    }

    /// Location query string, `?search=..&page=..`, or empty when both are default.
    pub fn location_query(&self) -> String {
        let mut params = Vec::new();
        if !self.active_search.is_empty() {
            params.push(format!("search={}", urlencoding::encode(&self.active_search)));
        }
        if self.current_page > 0 {
            params.push(format!("page={}", self.current_page));
        }
        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }

    /// Re-derives search and page from a location query. Sort and status are
    /// not part of the location and are kept.
    pub fn sync_from_query(&mut self, query: &str) {
        let mut search = String::new();
        let mut page = 0;

        for (key, value) in parse_query(query) {
            match key.as_str() {
                "search" => search = value,
                "page" => page = value.parse().unwrap_or(0),
                _ => {}
            }
        }

        self.search_draft = search.clone();
        self.active_search = search;
        self.current_page = page;
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(s: &str) -> String {
    let s = s.replace('+', " ");
    urlencoding::decode(&s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.clone())
}

/// Stack of catalog locations, the terminal stand-in for browser history.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    /// Records a location unless it is the one already on top.
    pub fn push(&mut self, location: String) {
        if self.entries.last() != Some(&location) {
            self.entries.push(location);
        }
    }

    pub fn current(&self) -> &str {
        self.entries.last().map(String::as_str).unwrap_or("")
    }

    /// Drops the current location and returns the one before it.
    pub fn back(&mut self) -> Option<&str> {
        if self.entries.len() < 2 {
            return None;
        }
        self.entries.pop();
        self.entries.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manga(id: i64, status: Option<&str>) -> Manga {
        Manga {
            id,
            status: status.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_query_is_newest_list() {
        let state = BrowseState::default();
        assert_eq!(
            state.query(),
            CatalogQuery::List { page: 0, size: 15, sort: SortOrder::IdDesc }
        );
        assert_eq!(state.location_query(), "");
    }

    #[test]
    fn test_submit_search_resets_page_and_location() {
        let mut state = BrowseState::default();
        state.set_page(4);
        state.search_draft = "naruto".into();
        state.submit_search();

        assert_eq!(state.current_page, 0);
        assert_eq!(state.active_search, "naruto");
        assert_eq!(state.location_query(), "?search=naruto");
        assert_eq!(
            state.query(),
            CatalogQuery::Search { title: "naruto".into(), page: 0, size: 15 }
        );
    }

    #[test]
    fn test_draft_does_not_change_query_until_submitted() {
        let mut state = BrowseState::default();
        state.search_draft = "bleach".into();
        assert!(matches!(state.query(), CatalogQuery::List { .. }));
    }

    #[test]
    fn test_sort_change_resets_page() {
        let mut state = BrowseState::default();
        state.set_page(3);
        state.set_sort(SortOrder::TitleAsc);
        assert_eq!(state.current_page, 0);
        assert_eq!(
            state.query(),
            CatalogQuery::List { page: 0, size: 15, sort: SortOrder::TitleAsc }
        );
    }

    #[test]
    fn test_location_round_trip_with_page_and_spaces() {
        let mut state = BrowseState::default();
        state.search_draft = "one piece".into();
        state.submit_search();
        state.set_page(2);
        assert_eq!(state.location_query(), "?search=one%20piece&page=2");

        let restored = BrowseState::from_query("?search=one+piece&page=2");
        assert_eq!(restored.active_search, "one piece");
        assert_eq!(restored.search_draft, "one piece");
        assert_eq!(restored.current_page, 2);
    }

    #[test]
    fn test_sync_from_query_defaults_missing_params() {
        let mut state = BrowseState::default();
        state.search_draft = "x".into();
        state.submit_search();
        state.set_page(7);
        state.set_sort(SortOrder::TitleDesc);

        state.sync_from_query("?page=abc");
        assert_eq!(state.active_search, "");
        assert_eq!(state.current_page, 0);
        assert_eq!(state.sort_order, SortOrder::TitleDesc);
    }

    #[test]
    fn test_status_filter_is_client_side() {
        let mut state = BrowseState::default();
        let content = vec![
            manga(1, Some("Completo")),
            manga(2, Some("Pausado")),
            manga(3, None),
        ];
        assert_eq!(state.apply_filter(&content).len(), 3);

        state.status_filter = Some("Completo".into());
        let filtered = state.apply_filter(&content);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
        assert!(matches!(state.query(), CatalogQuery::List { .. }));
    }

    #[test]
    fn test_cycle_status_filter() {
        let mut state = BrowseState::default();
        assert_eq!(state.status_label(), "All");
        state.cycle_status_filter();
        assert_eq!(state.status_filter.as_deref(), Some("Em Lançamento"));
        assert_eq!(state.status_label(), "Ongoing");
        state.cycle_status_filter();
        state.cycle_status_filter();
        assert_eq!(state.status_label(), "Paused");
        state.cycle_status_filter();
        assert_eq!(state.status_filter, None);
    }

    #[test]
    fn test_history_back_restores_previous_location() {
        let mut history = History::default();
        history.push(String::new());
        history.push("?search=naruto".into());
        history.push("?search=naruto".into());
        history.push("?search=naruto&page=1".into());
        assert_eq!(history.len(), 3);

        assert_eq!(history.back(), Some("?search=naruto"));
        let state = BrowseState::from_query(history.current());
        assert_eq!(state.active_search, "naruto");
        assert_eq!(state.current_page, 0);

        assert_eq!(history.back(), Some(""));
        assert_eq!(history.back(), None);
    }
}
