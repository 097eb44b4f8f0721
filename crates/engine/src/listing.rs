//! List + filter + paginate controller.
//!
//! The controller never talks to the backend itself. Every state change that
//! needs data returns a [`FetchRequest`]; the caller runs it and hands the
//! result back to [`ListController::apply`] with the request's sequence
//! number. Only the most recently issued request may change the held page,
//! so a slow earlier response cannot overwrite a newer one.
use std::{collections::BTreeSet, time::Duration};

use api_types::{PageQuery, Paginated};
use tokio::time::Instant;

use crate::{EngineError, debounce::Debouncer};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Items that expose the values the filter option lists are built from.
pub trait Faceted {
    fn category(&self) -> Option<&str>;
    fn facet(&self) -> Option<&str>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Effective (debounced) search term.
    pub search: String,
    pub category: Option<String>,
    pub facet: Option<String>,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub query: PageQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Replaced,
    /// A newer request was issued; the response was dropped.
    Stale,
}

#[derive(Debug)]
pub struct ListController<T> {
    filters: FilterState,
    limit: u32,
    scope: Option<String>,
    search_input: String,
    debounce: Debouncer<String>,
    collection: Paginated<T>,
    latest_seq: u64,
    loading: bool,
    error: Option<String>,
}

impl<T> ListController<T> {
    pub fn new(limit: u32) -> Self {
        Self::with_debounce(limit, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(limit: u32, delay: Duration) -> Self {
        let limit = limit.max(1);
        Self {
            filters: FilterState {
                page: 1,
                ..FilterState::default()
            },
            limit,
            scope: None,
            search_input: String::new(),
            debounce: Debouncer::new(delay),
            collection: Paginated::empty(limit),
            latest_seq: 0,
            loading: false,
            error: None,
        }
    }

    /// Restricts every query to one owner (sent as the listing's scope key).
    pub fn scoped(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Starts with a facet already selected, without issuing a request.
    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.filters.facet = normalize(Some(facet.into()));
        self
    }

    pub fn set_scope(&mut self, scope: Option<String>) {
        self.scope = scope;
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn collection(&self) -> &Paginated<T> {
        &self.collection
    }

    pub fn items(&self) -> &[T] {
        &self.collection.data
    }

    pub fn page(&self) -> u32 {
        self.filters.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_page(&self) -> u32 {
        self.collection.last_page()
    }

    pub fn can_prev(&self) -> bool {
        self.filters.page > 1
    }

    pub fn can_next(&self) -> bool {
        self.filters.page < self.last_page()
    }

    /// First load of the current filters.
    pub fn initial_fetch(&mut self) -> FetchRequest {
        self.issue()
    }

    /// Re-fetches the current page, e.g. after a save elsewhere.
    pub fn refresh(&mut self) -> FetchRequest {
        self.issue()
    }

    /// Records a keystroke. The term becomes effective in
    /// [`poll_debounce`](Self::poll_debounce) once typing pauses.
    pub fn set_search_input(&mut self, text: impl Into<String>, now: Instant) {
        self.search_input = text.into();
        self.debounce.push(self.search_input.clone(), now);
    }

    pub fn has_pending_search(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn poll_debounce(&mut self, now: Instant) -> Option<FetchRequest> {
        let settled = self.debounce.poll(now)?;
        let settled = settled.trim();
        if settled == self.filters.search {
            return None;
        }
        self.filters.search = settled.to_string();
        self.filters.page = 1;
        Some(self.issue())
    }

    pub fn set_category(&mut self, category: Option<String>) -> Option<FetchRequest> {
        let category = normalize(category);
        if category == self.filters.category {
            return None;
        }
        self.filters.category = category;
        self.filters.page = 1;
        Some(self.issue())
    }

    pub fn set_facet(&mut self, facet: Option<String>) -> Option<FetchRequest> {
        let facet = normalize(facet);
        if facet == self.filters.facet {
            return None;
        }
        self.filters.facet = facet;
        self.filters.page = 1;
        Some(self.issue())
    }

    /// Clears every filter; fetches only if something changed.
    pub fn clear_filters(&mut self) -> Option<FetchRequest> {
        self.debounce.cancel();
        self.search_input.clear();
        let unchanged = self.filters.search.is_empty()
            && self.filters.category.is_none()
            && self.filters.facet.is_none();
        if unchanged {
            return None;
        }
        self.filters.search.clear();
        self.filters.category = None;
        self.filters.facet = None;
        self.filters.page = 1;
        Some(self.issue())
    }

    pub fn next_page(&mut self) -> Option<FetchRequest> {
        if !self.can_next() {
            return None;
        }
        self.filters.page += 1;
        Some(self.issue())
    }

    pub fn prev_page(&mut self) -> Option<FetchRequest> {
        if !self.can_prev() {
            return None;
        }
        self.filters.page -= 1;
        Some(self.issue())
    }

    /// Applies the result of the request tagged `seq`.
    ///
    /// Stale responses are dropped, successes or failures alike. A failure of
    /// the latest request keeps the held page and is returned to the caller
    /// for alerting.
    pub fn apply(
        &mut self,
        seq: u64,
        result: Result<Paginated<T>, EngineError>,
    ) -> Result<Applied, EngineError> {
        if seq != self.latest_seq {
            tracing::debug!(seq, latest = self.latest_seq, "dropping stale page");
            return Ok(Applied::Stale);
        }
        self.loading = false;
        match result {
            Ok(mut page) => {
                let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
                if page.data.len() > limit {
                    tracing::warn!(
                        got = page.data.len(),
                        limit,
                        "backend returned more items than requested"
                    );
                    page.data.truncate(limit);
                }
                page.limit = self.limit;
                page.page = self.filters.page;
                self.collection = page;
                self.error = None;
                Ok(Applied::Replaced)
            }
            Err(err) => {
                self.error = Some(err.alert_message());
                Err(err)
            }
        }
    }

    fn issue(&mut self) -> FetchRequest {
        self.latest_seq += 1;
        self.loading = true;
        let search = Some(self.filters.search.clone()).filter(|s| !s.is_empty());
        FetchRequest {
            seq: self.latest_seq,
            query: PageQuery {
                page: self.filters.page,
                limit: self.limit,
                search,
                category: self.filters.category.clone(),
                facet: self.filters.facet.clone(),
                scope: self.scope.clone(),
            },
        }
    }
}

impl<T: Faceted> ListController<T> {
    /// Categories present on the loaded page only.
    pub fn category_options(&self) -> Vec<String> {
        collect_options(self.collection.data.iter().filter_map(T::category))
    }

    /// Facet values (region, status, type) present on the loaded page only.
    pub fn facet_options(&self) -> Vec<String> {
        collect_options(self.collection.data.iter().filter_map(T::facet))
    }
}

fn collect_options<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Cycles through `None` and each option, used by single-key filter toggles.
pub fn cycle_option(current: Option<&str>, options: &[String]) -> Option<String> {
    match current {
        None => options.first().cloned(),
        Some(current) => options
            .iter()
            .position(|option| option == current)
            .and_then(|idx| options.get(idx + 1))
            .cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiError;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        category: &'static str,
        region: &'static str,
    }

    impl Faceted for Item {
        fn category(&self) -> Option<&str> {
            Some(self.category)
        }

        fn facet(&self) -> Option<&str> {
            Some(self.region)
        }
    }

    fn page_of(items: Vec<Item>, total: u64, page: u32) -> Paginated<Item> {
        Paginated {
            data: items,
            total,
            page,
            limit: 10,
        }
    }

    fn loaded(total: u64, page: u32) -> ListController<Item> {
        let mut list = ListController::new(10);
        let req = list.initial_fetch();
        list.apply(req.seq, Ok(page_of(Vec::new(), total, 1))).unwrap();
        while list.page() < page {
            let req = list.next_page().unwrap();
            list.apply(req.seq, Ok(page_of(Vec::new(), total, list.page())))
                .unwrap();
        }
        list
    }

    #[test]
    fn filter_changes_reset_page_to_one() {
        let mut list = loaded(100, 4);
        assert_eq!(list.page(), 4);
        let req = list.set_category(Some("grain".to_string())).unwrap();
        assert_eq!(req.query.page, 1);

        let mut list = loaded(100, 3);
        let req = list.set_facet(Some("Nakuru".to_string())).unwrap();
        assert_eq!(req.query.page, 1);

        let mut list = loaded(100, 5);
        let now = Instant::now();
        list.set_search_input("beans", now);
        let req = list.poll_debounce(now + SEARCH_DEBOUNCE).unwrap();
        assert_eq!(req.query.page, 1);
        assert_eq!(req.query.search.as_deref(), Some("beans"));
    }

    #[test]
    fn unchanged_filter_does_not_fetch() {
        let mut list = loaded(30, 2);
        assert!(list.set_category(None).is_none());
        assert!(list.set_category(Some("  ".to_string())).is_none());
        assert_eq!(list.page(), 2);
    }

    #[test]
    fn fast_typing_issues_one_fetch_with_last_term() {
        let mut list = loaded(30, 1);
        let start = Instant::now();
        let ms = Duration::from_millis;
        let mut fetches = Vec::new();

        for (offset, text) in [(0, "a"), (150, "ab"), (300, "abc")] {
            list.set_search_input(text, start + ms(offset));
            fetches.extend(list.poll_debounce(start + ms(offset)));
        }
        for tick in (300..1500).step_by(50) {
            fetches.extend(list.poll_debounce(start + ms(tick)));
        }

        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].query.search.as_deref(), Some("abc"));
    }

    #[test]
    fn pagination_controls_stop_at_bounds() {
        let mut list = loaded(25, 1);
        assert_eq!(list.last_page(), 3);
        assert!(!list.can_prev());
        assert!(list.prev_page().is_none());

        let mut pages = Vec::new();
        while let Some(req) = list.next_page() {
            pages.push(req.query.page);
            list.apply(req.seq, Ok(page_of(Vec::new(), 25, req.query.page)))
                .unwrap();
        }
        assert_eq!(pages, vec![2, 3]);
        assert!(!list.can_next());

        while let Some(req) = list.prev_page() {
            assert!(req.query.page >= 1);
            list.apply(req.seq, Ok(page_of(Vec::new(), 25, req.query.page)))
                .unwrap();
        }
        assert_eq!(list.page(), 1);
    }

    #[test]
    fn stale_response_never_replaces_newer_one() {
        let mut list = ListController::new(10);
        let first = list.initial_fetch();
        let second = list.set_category(Some("grain".to_string())).unwrap();

        let newer = vec![Item {
            category: "grain",
            region: "Kisumu",
        }];
        assert_eq!(
            list.apply(second.seq, Ok(page_of(newer.clone(), 1, 1))).unwrap(),
            Applied::Replaced
        );
        let older = vec![Item {
            category: "produce",
            region: "Nakuru",
        }];
        assert_eq!(
            list.apply(first.seq, Ok(page_of(older, 1, 1))).unwrap(),
            Applied::Stale
        );
        assert_eq!(list.items(), newer.as_slice());
    }

    #[test]
    fn failed_fetch_keeps_current_page() {
        let mut list = ListController::new(10);
        let req = list.initial_fetch();
        let items = vec![Item {
            category: "grain",
            region: "Kisumu",
        }];
        list.apply(req.seq, Ok(page_of(items.clone(), 1, 1))).unwrap();

        let req = list.refresh();
        let err = list
            .apply(req.seq, Err(ApiError::Server("boom".to_string()).into()))
            .unwrap_err();
        assert!(matches!(err, EngineError::Api(ApiError::Server(_))));
        assert_eq!(list.items(), items.as_slice());
        assert!(list.error().is_some());
        assert!(!list.is_loading());
    }

    #[test]
    fn options_come_from_loaded_page_only() {
        let mut list = ListController::new(10);
        let req = list.initial_fetch();
        let items = vec![
            Item {
                category: "grain",
                region: "Nakuru",
            },
            Item {
                category: "produce",
                region: "Nakuru",
            },
            Item {
                category: "grain",
                region: "Eldoret",
            },
        ];
        list.apply(req.seq, Ok(page_of(items, 40, 1))).unwrap();
        assert_eq!(list.category_options(), vec!["grain", "produce"]);
        assert_eq!(list.facet_options(), vec!["Eldoret", "Nakuru"]);

        let req = list.next_page().unwrap();
        let items = vec![Item {
            category: "dairy",
            region: "Nyeri",
        }];
        list.apply(req.seq, Ok(page_of(items, 40, 2))).unwrap();
        assert_eq!(list.category_options(), vec!["dairy"]);
    }

    #[test]
    fn oversized_page_is_truncated_to_limit() {
        let mut list = ListController::new(2);
        let req = list.initial_fetch();
        let item = Item {
            category: "grain",
            region: "Nakuru",
        };
        let page = Paginated {
            data: vec![item.clone(), item.clone(), item],
            total: 3,
            page: 1,
            limit: 2,
        };
        list.apply(req.seq, Ok(page)).unwrap();
        assert_eq!(list.items().len(), 2);
    }

    #[test]
    fn cycle_option_wraps_back_to_none() {
        let options = vec!["a".to_string(), "b".to_string()];
        assert_eq!(cycle_option(None, &options).as_deref(), Some("a"));
        assert_eq!(cycle_option(Some("a"), &options).as_deref(), Some("b"));
        assert_eq!(cycle_option(Some("b"), &options), None);
        assert_eq!(cycle_option(Some("gone"), &options), None);
    }
}
