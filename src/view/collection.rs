//! The collection view: one list page's worth of state
//!
//! A view owns the last fetched snapshot and everything derived from it:
//!
//! ```text
//! refresh() ──▶ snapshot ──▶ filter ──▶ sort ──▶ paginate ──▶ visible()
//!    ▲                                                          │
//!    └────────────── perform(mutation) ◀── user action ◀────────┘
//! ```
//!
//! Filter, search and sort changes recompute the derived list from the
//! snapshot without a request. Server-paginated resources instead mark the
//! view stale; the next `refresh()` fetches the matching page.
//!
//! State sits behind a mutex that is never held across an `.await`, so a
//! view can be shared between tasks by reference or `Arc`.

use crate::config::{PaginationMode, ResourceConfig};
use crate::core::error::ViewError;
use crate::core::events::{CollectionEvent, EventBus};
use crate::core::filter::{FilterCriteria, FilterEngine, RangeBound};
use crate::core::pagination::{LoadMore, PageWindow, Pagination, Paginator};
use crate::core::query::QueryParams;
use crate::core::record::{Item, Record};
use crate::core::selection::SelectionSet;
use crate::core::service::{CollectionService, MutationOutcome};
use crate::core::sort::{SortDirection, SortKey, SortSpec, sort};
use crate::core::status::StatusWorkflow;
use crate::view::fetcher::Fetcher;
use crate::view::in_flight::InFlight;
use crate::view::mutation::{Mutation, MutationCoordinator, UpdatePolicy};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct ViewState {
    snapshot: Vec<Item>,
    total_count: usize,
    loaded: bool,
    loading: bool,
    stale: bool,
    /// Bumped by every change that makes a server-paginated view stale
    generation: u64,
    /// Backend reported more items than one client-side fetch returned
    truncated: bool,
    last_error: Option<ViewError>,
    criteria: FilterCriteria,
    sort: Option<SortSpec>,
    pagination: Pagination,
    selection: SelectionSet,
    /// Optimistic patches by item id, dropped when a refetch lands
    overlay: IndexMap<String, Value>,
}

/// Client-side collection view over one resource
pub struct CollectionView {
    resource: ResourceConfig,
    policy: UpdatePolicy,
    engine: FilterEngine,
    fetcher: Fetcher,
    mutations: MutationCoordinator,
    in_flight: Arc<InFlight>,
    events: Option<EventBus>,
    state: Mutex<ViewState>,
}

impl CollectionView {
    /// Create a view over `service` configured by `resource`
    pub fn new(service: Arc<dyn CollectionService>, resource: ResourceConfig, page_size: usize) -> Self {
        let in_flight = Arc::new(InFlight::new());
        let page_size = resource.page_size.unwrap_or(page_size).max(1);

        let pagination = match resource.pagination {
            PaginationMode::LoadMore => {
                Pagination::LoadMore(LoadMore::new(page_size, resource.load_more_increment))
            }
            PaginationMode::Client | PaginationMode::Server => {
                Pagination::Pages(Paginator::new(page_size))
            }
        };

        let policy = if resource.optimistic_updates {
            UpdatePolicy::Optimistic
        } else {
            UpdatePolicy::Pessimistic
        };

        Self {
            engine: FilterEngine::new(resource.search_fields.clone()),
            fetcher: Fetcher::new(service.clone(), in_flight.clone()),
            mutations: MutationCoordinator::new(service, in_flight.clone()),
            in_flight,
            events: None,
            policy,
            state: Mutex::new(ViewState {
                snapshot: Vec::new(),
                total_count: 0,
                loaded: false,
                loading: false,
                stale: true,
                generation: 0,
                truncated: false,
                last_error: None,
                criteria: FilterCriteria::default(),
                sort: resource.default_sort(),
                pagination,
                selection: SelectionSet::new(),
                overlay: IndexMap::new(),
            }),
            resource,
        }
    }

    /// Publish collection events on `bus`
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Override the resource's update policy
    pub fn with_policy(mut self, policy: UpdatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn resource(&self) -> &ResourceConfig {
        &self.resource
    }

    pub fn policy(&self) -> UpdatePolicy {
        self.policy
    }

    /// Status transitions offered for this resource
    pub fn workflow(&self) -> &StatusWorkflow {
        &self.resource.statuses
    }

    pub(crate) fn in_flight(&self) -> &Arc<InFlight> {
        &self.in_flight
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: CollectionEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    fn server_paginated(&self) -> bool {
        self.resource.pagination == PaginationMode::Server
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Parameters the next refresh will send
    pub fn query_params(&self) -> QueryParams {
        self.params_for(&self.state())
    }

    fn params_for(&self, state: &ViewState) -> QueryParams {
        if !self.server_paginated() {
            let params = QueryParams::new(1, self.resource.fetch_limit);
            return match &state.sort {
                Some(spec) => params.with_sort(spec),
                None => params,
            };
        }

        let (page, limit) = match &state.pagination {
            Pagination::Pages(p) => (p.page_index() + 1, p.page_size()),
            Pagination::LoadMore(l) => (1, l.visible_count()),
        };
        let params = QueryParams::new(page, limit)
            .with_criteria(&state.criteria, self.resource.date_field.as_deref());
        match &state.sort {
            Some(spec) => params.with_sort(spec),
            None => params,
        }
    }

    /// Fetch the collection and replace the snapshot
    ///
    /// On failure the previous snapshot, filters and selection are kept and
    /// the error is remembered in [`last_error`](Self::last_error). A refresh
    /// superseded by a newer one returns `ViewError::Cancelled` and changes
    /// nothing. A query change made while the fetch was in flight leaves the
    /// view stale.
    pub async fn refresh(&self) -> Result<(), ViewError> {
        let (params, generation) = {
            let mut state = self.state();
            state.loading = true;
            (self.params_for(&state), state.generation)
        };

        match self.fetcher.fetch(&params).await {
            Ok((query, page)) => {
                let mut state = self.state();
                if !self.fetcher.is_current(query) {
                    return Err(ViewError::Cancelled);
                }

                state.truncated = !self.server_paginated() && page.total_count > page.items.len();
                if state.truncated {
                    tracing::warn!(
                        resource = %self.resource.name,
                        fetched = page.items.len(),
                        total = page.total_count,
                        fetch_limit = self.resource.fetch_limit,
                        "Collection exceeds fetch limit; filters and search only see the fetched items"
                    );
                }

                state.selection.retain(page.items.iter().map(|i| i.id()));
                state.total_count = page.total_count;
                state.snapshot = page.items;
                state.overlay.clear();
                state.loaded = true;
                state.loading = false;
                state.stale = state.generation != generation;
                state.last_error = None;
                self.sync_total(&mut state);

                self.publish(CollectionEvent::Refreshed {
                    resource: self.resource.name.clone(),
                    item_count: state.snapshot.len(),
                    total_count: state.total_count,
                });
                Ok(())
            }
            Err(ViewError::Cancelled) => {
                if self.in_flight.is_empty() {
                    self.state().loading = false;
                }
                Err(ViewError::Cancelled)
            }
            Err(err) => {
                {
                    let mut state = self.state();
                    state.loading = false;
                    state.last_error = Some(err.clone());
                }
                self.publish(CollectionEvent::FetchFailed {
                    resource: self.resource.name.clone(),
                    error_code: err.error_code().to_string(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Refresh only when a server-paginated view has pending changes
    pub async fn refresh_if_stale(&self) -> Result<bool, ViewError> {
        if !self.is_stale() {
            return Ok(false);
        }
        self.refresh().await.map(|_| true)
    }

    /// Abort every request in flight without closing the view
    pub fn cancel(&self) {
        self.in_flight.cancel_all();
        self.state().loading = false;
    }

    /// Abort everything and refuse further requests
    pub fn close(&self) {
        self.in_flight.close();
        self.state().loading = false;
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    /// Whether at least one fetch has completed
    pub fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    /// Whether the visible data no longer matches the query
    pub fn is_stale(&self) -> bool {
        self.state().stale
    }

    /// Error of the last failed fetch, cleared by the next successful one
    pub fn last_error(&self) -> Option<ViewError> {
        self.state().last_error.clone()
    }

    /// Items held from the last fetch
    pub fn snapshot(&self) -> Vec<Item> {
        self.state().snapshot.clone()
    }

    /// Total reported by the backend for the last fetch
    pub fn total_count(&self) -> usize {
        self.state().total_count
    }

    /// Whether the last client-side fetch hit `fetch_limit` before the end of the collection
    pub fn is_truncated(&self) -> bool {
        self.state().truncated
    }

    // =========================================================================
    // Filters and sorting
    // =========================================================================

    pub fn criteria(&self) -> FilterCriteria {
        self.state().criteria.clone()
    }

    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.state().sort.clone()
    }

    /// Replace every filter at once
    pub fn set_criteria(&self, criteria: FilterCriteria) {
        self.update_query(|state| state.criteria = criteria);
    }

    pub fn set_search(&self, term: impl Into<String>) {
        let term = term.into();
        self.update_query(|state| state.criteria.search_term = term);
    }

    pub fn set_exact(&self, field: impl Into<String>, value: impl Into<String>) {
        let (field, value) = (field.into(), value.into());
        self.update_query(|state| {
            state.criteria.exact_match.insert(field, value);
        });
    }

    pub fn remove_exact(&self, field: &str) {
        self.update_query(|state| {
            state.criteria.exact_match.shift_remove(field);
        });
    }

    /// Select a status tab; `None` is the "All" tab
    pub fn set_status_tab(&self, status: Option<&str>) {
        match status {
            Some(status) => self.set_exact("status", status),
            None => self.remove_exact("status"),
        }
    }

    pub fn set_range(&self, field: impl Into<String>, bound: RangeBound) {
        let field = field.into();
        self.update_query(|state| {
            state.criteria.range.insert(field, bound);
        });
    }

    pub fn remove_range(&self, field: &str) {
        self.update_query(|state| {
            state.criteria.range.shift_remove(field);
        });
    }

    pub fn clear_filters(&self) {
        self.update_query(|state| state.criteria = FilterCriteria::default());
    }

    /// Set or clear the sort
    pub fn set_sort(&self, spec: Option<SortSpec>) {
        self.update_query(|state| state.sort = spec);
    }

    /// Column-header click: sort by `field`, flipping direction on repeat clicks
    pub fn toggle_sort(&self, field: &str) {
        self.update_query(|state| {
            let next = match &state.sort {
                Some(current) if current.sort_by() == field => SortSpec {
                    key: current.key.clone(),
                    direction: current.direction.reversed(),
                },
                _ => SortSpec {
                    key: SortKey::Field(field.to_string()),
                    direction: SortDirection::Asc,
                },
            };
            state.sort = Some(next);
        });
    }

    /// Apply a filter or sort change: back to the first page
    fn update_query(&self, change: impl FnOnce(&mut ViewState)) {
        let mut state = self.state();
        change(&mut state);
        state.pagination.reset();
        if self.server_paginated() {
            state.stale = true;
            state.generation += 1;
        }
        self.sync_total(&mut state);
    }

    /// Keep the paginator's total in line with what it pages over
    fn sync_total(&self, state: &mut ViewState) {
        let total = if self.server_paginated() {
            state.total_count
        } else {
            self.derive(state).len()
        };
        state.pagination.set_total(total);
    }

    /// Snapshot with the overlay applied, filtered and sorted
    fn derive(&self, state: &ViewState) -> Vec<Item> {
        let patched: Vec<Item> = state
            .snapshot
            .iter()
            .map(|item| match state.overlay.get(item.id()) {
                Some(patch) => {
                    let mut item = item.clone();
                    item.merge_patch(patch);
                    item
                }
                None => item.clone(),
            })
            .collect();

        let filtered = self.engine.filter(&patched, &state.criteria);
        let ordered = match &state.sort {
            Some(spec) => sort(&filtered, spec),
            None => filtered,
        };
        ordered.into_iter().cloned().collect()
    }

    /// Every item passing the filters, in display order
    pub fn filtered(&self) -> Vec<Item> {
        let state = self.state();
        self.derive(&state)
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered().len()
    }

    /// Items in the current window
    ///
    /// Server-paginated views show the fetched page as-is after the client
    /// filters; the backend already windowed it.
    pub fn visible(&self) -> Vec<Item> {
        let state = self.state();
        let derived = self.derive(&state);
        if self.server_paginated() {
            return derived;
        }
        state.pagination.window(&derived).to_vec()
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Current page window; `None` for load-more views
    pub fn page(&self) -> Option<PageWindow> {
        match &self.state().pagination {
            Pagination::Pages(p) => Some(p.page()),
            Pagination::LoadMore(_) => None,
        }
    }

    pub fn has_next_page(&self) -> bool {
        match &self.state().pagination {
            Pagination::Pages(p) => p.has_next_page(),
            Pagination::LoadMore(_) => false,
        }
    }

    pub fn has_previous_page(&self) -> bool {
        match &self.state().pagination {
            Pagination::Pages(p) => p.has_previous_page(),
            Pagination::LoadMore(_) => false,
        }
    }

    pub fn next_page(&self) -> bool {
        self.navigate(|p| p.next())
    }

    pub fn previous_page(&self) -> bool {
        self.navigate(|p| p.previous())
    }

    pub fn go_to_page(&self, page_index: usize) -> bool {
        self.navigate(|p| {
            let before = p.page_index();
            p.go_to(page_index);
            p.page_index() != before
        })
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.navigate(|p| {
            p.set_page_size(page_size);
            true
        });
    }

    fn navigate(&self, step: impl FnOnce(&mut Paginator) -> bool) -> bool {
        let mut state = self.state();
        let changed = match &mut state.pagination {
            Pagination::Pages(p) => step(p),
            Pagination::LoadMore(_) => false,
        };
        if changed && self.server_paginated() {
            state.stale = true;
            state.generation += 1;
        }
        changed
    }

    /// Grow a load-more window; returns whether more items became visible
    pub fn load_more(&self) -> bool {
        let mut state = self.state();
        let total = self.derive(&state).len();
        match &mut state.pagination {
            Pagination::LoadMore(l) if l.has_more(total) => {
                l.load_more();
                true
            }
            _ => false,
        }
    }

    /// Whether a load-more view has hidden items left
    pub fn has_more(&self) -> bool {
        let state = self.state();
        match &state.pagination {
            Pagination::LoadMore(l) => l.has_more(self.derive(&state).len()),
            Pagination::Pages(p) => p.has_next_page(),
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Toggle one item; ids outside the snapshot are ignored
    pub fn toggle_selection(&self, id: &str) -> bool {
        let mut state = self.state();
        if !state.snapshot.iter().any(|i| i.id() == id) {
            return false;
        }
        state.selection.toggle(id)
    }

    /// Select every visible item, or clear if all of them are selected
    pub fn select_all_visible(&self) {
        let ids: Vec<String> = self.visible().into_iter().map(|i| i.id).collect();
        self.state().selection.select_all(ids);
    }

    /// Select every filtered item across pages, or clear if all are selected
    pub fn select_all_filtered(&self) {
        let ids: Vec<String> = self.filtered().into_iter().map(|i| i.id).collect();
        self.state().selection.select_all(ids);
    }

    pub fn clear_selection(&self) {
        self.state().selection.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.state().selection.is_selected(id)
    }

    pub fn selection(&self) -> SelectionSet {
        self.state().selection.clone()
    }

    /// Selected items, in snapshot order
    pub fn selected_items(&self) -> Vec<Item> {
        let state = self.state();
        state
            .selection
            .selected(&state.snapshot)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Sum `accumulator` over the selected items
    pub fn aggregate_selected(&self, accumulator: impl Fn(&Item) -> f64) -> f64 {
        let state = self.state();
        state.selection.aggregate(&state.snapshot, accumulator)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Perform a mutation, then refetch
    ///
    /// Under the optimistic policy, updates and status transitions show
    /// immediately through an overlay that the refetch replaces. A failed
    /// mutation removes its overlay and leaves everything else untouched.
    /// A failed refetch after a successful mutation is recorded in
    /// [`last_error`](Self::last_error); the mutation result is still
    /// returned.
    pub async fn perform(&self, mutation: Mutation) -> Result<MutationOutcome, ViewError> {
        let outcome = self.send(&mutation).await?;
        self.refetch_after_mutation().await;
        Ok(outcome)
    }

    /// Perform several mutations, then refetch once
    ///
    /// Every mutation is attempted; results are returned in input order.
    pub async fn perform_bulk(&self, mutations: Vec<Mutation>) -> Vec<Result<MutationOutcome, ViewError>> {
        let mut results = Vec::with_capacity(mutations.len());
        for mutation in &mutations {
            results.push(self.send(mutation).await);
        }
        if results.iter().any(Result::is_ok) {
            self.refetch_after_mutation().await;
        }
        results
    }

    async fn send(&self, mutation: &Mutation) -> Result<MutationOutcome, ViewError> {
        let overlay = match (self.policy, mutation.optimistic_patch()) {
            (UpdatePolicy::Optimistic, Some((id, patch))) => {
                let mut state = self.state();
                let previous = state.overlay.get(id).cloned();
                let merged = merge_overlay(previous.as_ref(), patch);
                state.overlay.insert(id.to_string(), merged);
                self.sync_total(&mut state);
                Some((id.to_string(), previous))
            }
            _ => None,
        };

        match self.mutations.send(mutation).await {
            Ok(outcome) => {
                self.publish(CollectionEvent::MutationSucceeded {
                    resource: self.resource.name.clone(),
                    mutation: mutation.kind().to_string(),
                    item_id: mutation.target_id().map(String::from),
                });
                Ok(outcome)
            }
            Err(err) => {
                if let Some((id, previous)) = overlay {
                    let mut state = self.state();
                    match previous {
                        Some(patch) => state.overlay.insert(id, patch),
                        None => state.overlay.shift_remove(&id),
                    };
                    self.sync_total(&mut state);
                }
                self.publish(CollectionEvent::MutationFailed {
                    resource: self.resource.name.clone(),
                    mutation: mutation.kind().to_string(),
                    item_id: mutation.target_id().map(String::from),
                    error_code: err.error_code().to_string(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn refetch_after_mutation(&self) {
        match self.refresh().await {
            Ok(()) | Err(ViewError::Cancelled) => {}
            Err(err) => {
                tracing::warn!(
                    resource = %self.resource.name,
                    error = %err,
                    "Refetch after mutation failed; keeping previous snapshot"
                );
            }
        }
    }
}

impl Drop for CollectionView {
    fn drop(&mut self) {
        self.in_flight.close();
    }
}

fn merge_overlay(previous: Option<&Value>, patch: Value) -> Value {
    match (previous, patch) {
        (Some(Value::Object(prev)), Value::Object(next)) => {
            let mut merged = prev.clone();
            merged.extend(next);
            Value::Object(merged)
        }
        (_, patch) => patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryCollectionService;
    use serde_json::json;

    fn campaigns() -> (Arc<InMemoryCollectionService>, CollectionView) {
        let mut resource = ResourceConfig::new("campaigns", "/api/ads/campaigns");
        resource.search_fields = vec!["name".to_string()];
        let service = Arc::new(
            InMemoryCollectionService::new(resource.clone())
                .with_json(vec![
                    json!({"id": "1", "name": "Tech Tools Banner", "status": "active", "amount": 100}),
                    json!({"id": "2", "name": "SaaS Sidebar", "status": "paused", "amount": 50}),
                    json!({"id": "3", "name": "Spring Promo", "status": "active", "amount": 75}),
                ])
                .unwrap(),
        );
        let view = CollectionView::new(service.clone(), resource, 2);
        (service, view)
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id()).collect()
    }

    #[tokio::test]
    async fn test_refresh_loads_snapshot() {
        let (_, view) = campaigns();
        assert!(!view.is_loaded());
        view.refresh().await.unwrap();
        assert!(view.is_loaded());
        assert!(!view.is_loading());
        assert_eq!(view.snapshot().len(), 3);
        assert_eq!(ids(&view.visible()), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_filter_and_sort_pipeline() {
        let (_, view) = campaigns();
        view.refresh().await.unwrap();

        view.set_status_tab(Some("active"));
        view.set_sort(Some(SortSpec::desc("amount")));
        assert_eq!(ids(&view.visible()), vec!["1", "3"]);

        view.set_status_tab(None);
        assert_eq!(view.filtered_count(), 3);
    }

    #[tokio::test]
    async fn test_toggle_sort_flips_direction() {
        let (_, view) = campaigns();
        view.refresh().await.unwrap();

        view.toggle_sort("amount");
        assert_eq!(view.sort_spec(), Some(SortSpec::asc("amount")));
        view.toggle_sort("amount");
        assert_eq!(view.sort_spec(), Some(SortSpec::desc("amount")));
        view.toggle_sort("name");
        assert_eq!(view.sort_spec(), Some(SortSpec::asc("name")));
    }

    #[tokio::test]
    async fn test_toggle_selection_ignores_unknown_ids() {
        let (_, view) = campaigns();
        view.refresh().await.unwrap();
        assert!(!view.toggle_selection("nope"));
        assert!(view.toggle_selection("1"));
        assert!(view.is_selected("1"));
    }

    #[test]
    fn test_merge_overlay() {
        let merged = merge_overlay(Some(&json!({"status": "paused", "a": 1})), json!({"status": "active"}));
        assert_eq!(merged, json!({"status": "active", "a": 1}));
        assert_eq!(merge_overlay(None, json!({"b": 2})), json!({"b": 2}));
    }
}
