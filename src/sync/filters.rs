//! Filter state for paginated list views.
//!
//! A [`FilterState`] never stores an empty value: clearing a filter removes its key.
//! Any change other than the page number sends the view back to page 1.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Default page size for list views.
pub const DEFAULT_LIMIT: u32 = 50;

/// Hard upper bound on rows per page.
pub const MAX_LIMIT: u32 = 100;

/// Filter key reserved for free-text search.
pub const SEARCH_KEY: &str = "search";

const PAGE_KEY: &str = "page";
const LIMIT_KEY: &str = "limit";

/// Current filters of one list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    values: BTreeMap<String, String>,
    page: u32,
    limit: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }
}

impl FilterState {
    /// Empty filters on page 1 with the given page size.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            values: BTreeMap::new(),
            page: 1,
            limit: clamp_limit(limit),
        }
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Zero-based row offset of the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn search(&self) -> Option<&str> {
        self.get(SEARCH_KEY)
    }

    /// Exact-match filters, i.e. everything except the search term.
    pub fn exact_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .filter(|(key, _)| key.as_str() != SEARCH_KEY)
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Merge `patch` into these filters.
    ///
    /// Returns `None` when the merge would not change anything, so callers can keep the
    /// existing value (and its identity) and skip the fetch.
    pub fn merge(&self, patch: &FilterPatch) -> Option<FilterState> {
        let mut next = self.clone();

        for (key, value) in &patch.values {
            match value.as_deref().filter(|v| !v.is_empty()) {
                Some(v) => {
                    next.values.insert(key.clone(), v.to_string());
                }
                None => {
                    next.values.remove(key);
                }
            }
        }
        if let Some(limit) = patch.limit {
            next.limit = clamp_limit(limit);
        }

        let non_page_changed = next.values != self.values || next.limit != self.limit;
        next.page = if non_page_changed {
            1
        } else {
            patch.page.map_or(self.page, |page| page.max(1))
        };

        if next == *self {
            None
        } else {
            Some(next)
        }
    }

    /// Query-string form used by the HTTP adapter.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .values
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        pairs.push((PAGE_KEY.to_string(), self.page.to_string()));
        pairs.push((LIMIT_KEY.to_string(), self.limit.to_string()));
        pairs
    }

    /// Parse filters back out of a query string.
    ///
    /// Empty values are dropped, a missing or zero page becomes 1, and the limit is capped.
    pub fn from_query(params: &HashMap<String, String>, default_limit: u32) -> Result<Self, AppError> {
        let mut filters = Self::with_limit(default_limit);

        for (key, value) in params {
            match key.as_str() {
                PAGE_KEY => {
                    let page: u32 = value
                        .parse()
                        .map_err(|_| AppError::BadRequest(format!("Invalid page: {}", value)))?;
                    filters.page = page.max(1);
                }
                LIMIT_KEY => {
                    let limit: u32 = value
                        .parse()
                        .map_err(|_| AppError::BadRequest(format!("Invalid limit: {}", value)))?;
                    filters.limit = clamp_limit(limit);
                }
                _ if value.is_empty() => {}
                _ => {
                    filters.values.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(filters)
    }
}

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIMIT)
}

/// A partial filter update.
///
/// `None` (or an empty string) for a key means "remove this filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    values: BTreeMap<String, Option<String>>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a filter; an empty `value` clears it.
    pub fn set(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_opt(key, Some(value.into()))
    }

    /// Set or clear a filter.
    ///
    /// `page` and `limit` are not filters: numeric values land in the pagination fields,
    /// clearing `page` means page 1, and anything else for those keys is ignored.
    pub fn set_opt(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        let key = key.into();
        if key != PAGE_KEY && key != LIMIT_KEY {
            self.values.insert(key, value);
            return self;
        }

        let is_page = key == PAGE_KEY;
        let parsed = value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::parse::<u32>);
        match parsed {
            None if is_page => self.page = Some(1),
            None => {}
            Some(Ok(n)) if is_page => self.page = Some(n),
            Some(Ok(n)) => self.limit = Some(n),
            Some(Err(_)) => {
                tracing::warn!(key = %key, "Ignoring non-numeric pagination value");
            }
        }
        self
    }

    pub fn clear(self, key: impl Into<String>) -> Self {
        self.set_opt(key, None)
    }

    pub fn search(self, term: impl Into<String>) -> Self {
        self.set(SEARCH_KEY, term)
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn filters_with(pairs: &[(&str, &str)], page: u32) -> FilterState {
        let mut patch = FilterPatch::new();
        for (key, value) in pairs {
            patch = patch.set(*key, *value);
        }
        let mut filters = FilterState::default().merge(&patch).unwrap_or_default();
        filters.page = page;
        filters
    }

    #[test]
    fn test_defaults() {
        let filters = FilterState::default();
        assert_eq!(filters.page(), 1);
        assert_eq!(filters.limit(), 50);
        assert_eq!(filters.offset(), 0);
        assert!(filters.search().is_none());
    }

    #[rstest]
    #[case::empty_string(FilterPatch::new().set("categoryId", ""))]
    #[case::explicit_none(FilterPatch::new().set_opt("categoryId", None))]
    #[case::clear(FilterPatch::new().clear("categoryId"))]
    fn test_empty_value_removes_key(#[case] patch: FilterPatch) {
        let current = filters_with(&[("categoryId", "c1"), ("search", "desk")], 1);
        let next = current.merge(&patch).expect("removal is a change");
        assert!(next.get("categoryId").is_none());
        assert_eq!(next.search(), Some("desk"));
        assert!(next.to_query_pairs().iter().all(|(_, v)| !v.is_empty()));
    }

    #[test]
    fn test_empty_value_for_absent_key_is_noop() {
        let current = filters_with(&[("search", "desk")], 3);
        assert!(current.merge(&FilterPatch::new().set("status", "")).is_none());
    }

    #[rstest]
    #[case::search(FilterPatch::new().search("lamp"))]
    #[case::search_with_page(FilterPatch::new().search("lamp").page(7))]
    #[case::limit(FilterPatch::new().limit(20))]
    #[case::clear_existing(FilterPatch::new().clear("search"))]
    fn test_non_page_change_resets_page(#[case] patch: FilterPatch) {
        let current = filters_with(&[("search", "desk")], 4);
        let next = current.merge(&patch).expect("changed");
        assert_eq!(next.page(), 1);
    }

    #[test]
    fn test_page_only_change_keeps_page() {
        let current = filters_with(&[("search", "desk")], 1);
        let next = current.merge(&FilterPatch::new().page(3)).expect("changed");
        assert_eq!(next.page(), 3);
        assert_eq!(next.search(), Some("desk"));
        assert_eq!(next.offset(), 100);
    }

    #[test]
    fn test_page_zero_is_page_one() {
        let current = filters_with(&[], 2);
        let next = current.merge(&FilterPatch::new().page(0)).expect("changed");
        assert_eq!(next.page(), 1);
    }

    #[test]
    fn test_same_values_are_noop() {
        let current = filters_with(&[("search", "desk"), ("status", "available")], 2);
        let patch = FilterPatch::new()
            .search("desk")
            .set("status", "available")
            .page(2)
            .limit(50);
        assert!(current.merge(&patch).is_none());
        assert!(current.merge(&FilterPatch::new()).is_none());
    }

    #[test]
    fn test_limit_is_clamped() {
        let next = FilterState::default()
            .merge(&FilterPatch::new().limit(10_000))
            .expect("changed");
        assert_eq!(next.limit(), MAX_LIMIT);
    }

    #[test]
    fn test_exact_filters_exclude_search() {
        let filters = filters_with(&[("search", "desk"), ("status", "retired")], 1);
        let exact: Vec<_> = filters.exact_filters().collect();
        assert_eq!(exact, vec![("status", "retired")]);
    }

    #[test]
    fn test_query_round_trip() {
        let filters = filters_with(&[("search", "desk"), ("categoryId", "c1")], 3);
        let params: HashMap<String, String> = filters.to_query_pairs().into_iter().collect();
        let parsed = FilterState::from_query(&params, DEFAULT_LIMIT).unwrap();
        assert_eq!(parsed, filters);
    }

    #[test]
    fn test_from_query_normalizes() {
        let params: HashMap<String, String> = [
            ("page".to_string(), "0".to_string()),
            ("limit".to_string(), "500".to_string()),
            ("search".to_string(), String::new()),
        ]
        .into_iter()
        .collect();
        let parsed = FilterState::from_query(&params, 25).unwrap();
        assert_eq!(parsed.page(), 1);
        assert_eq!(parsed.limit(), MAX_LIMIT);
        assert!(parsed.search().is_none());
    }

    #[test]
    fn test_from_query_rejects_bad_page() {
        let params: HashMap<String, String> =
            [("page".to_string(), "two".to_string())].into_iter().collect();
        let err = FilterState::from_query(&params, DEFAULT_LIMIT).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[rstest]
    #[case::page(FilterPatch::new().set("page", "3"), 3, 50)]
    #[case::limit(FilterPatch::new().set("limit", "20"), 1, 20)]
    #[case::cleared_page(FilterPatch::new().clear("page"), 1, 50)]
    #[case::garbage(FilterPatch::new().set("page", "two"), 2, 50)]
    fn test_pagination_keys_never_become_filters(
        #[case] patch: FilterPatch,
        #[case] page: u32,
        #[case] limit: u32,
    ) {
        let current = filters_with(&[("search", "desk")], 2);
        let next = current.merge(&patch).unwrap_or_else(|| current.clone());
        assert_eq!(next.page(), page);
        assert_eq!(next.limit(), limit);
        assert_eq!(next.exact_filters().count(), 0);

        let pairs = next.to_query_pairs();
        assert_eq!(pairs.iter().filter(|(k, _)| k == "page").count(), 1);
        assert_eq!(pairs.iter().filter(|(k, _)| k == "limit").count(), 1);
    }
}
