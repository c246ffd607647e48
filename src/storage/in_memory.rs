//! In-memory implementation of CollectionService for testing and development

use crate::config::ResourceConfig;
use crate::core::error::ViewError;
use crate::core::filter::{FilterCriteria, FilterEngine, RangeBound};
use crate::core::query::QueryParams;
use crate::core::record::{Item, Record};
use crate::core::service::{CollectionService, FetchedPage, MutationOutcome};
use crate::core::sort::{SortSpec, sort};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use uuid::Uuid;

/// In-memory collection service
///
/// Serves the same query contract as a REST backend: search over the
/// configured fields, `status`/`category`/extra exact matches, a date range
/// on the configured date field, sorting and 1-based pagination. Uses
/// RwLock for thread-safe access.
#[derive(Clone)]
pub struct InMemoryCollectionService {
    resource: ResourceConfig,
    items: Arc<RwLock<Vec<Item>>>,
    latency: Option<Duration>,
    failure: Arc<RwLock<Option<ViewError>>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryCollectionService {
    pub fn new(resource: ResourceConfig) -> Self {
        Self {
            resource,
            items: Arc::new(RwLock::new(Vec::new())),
            latency: None,
            failure: Arc::new(RwLock::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Seed the collection
    pub fn with_items(self, items: Vec<Item>) -> Self {
        if let Ok(mut guard) = self.items.write() {
            *guard = items;
        }
        self
    }

    /// Seed the collection from JSON objects, reading ids from the resource's id field
    pub fn with_json(self, values: Vec<Value>) -> Result<Self, ViewError> {
        let items = values
            .into_iter()
            .map(|v| Item::from_json(v, &self.resource.id_field))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.with_items(items))
    }

    /// Delay every call, to simulate a slow backend
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: ViewError) {
        if let Ok(mut guard) = self.failure.write() {
            *guard = Some(error);
        }
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Current contents
    pub fn snapshot(&self) -> Result<Vec<Item>, ViewError> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Item>>, ViewError> {
        self.items
            .read()
            .map_err(|e| ViewError::server(Some(500), format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Item>>, ViewError> {
        self.items
            .write()
            .map_err(|e| ViewError::server(Some(500), format!("Failed to acquire write lock: {}", e)))
    }

    /// Count the call, wait out the latency, and surface an injected failure
    async fn begin(&self) -> Result<(), ViewError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let injected = self
            .failure
            .write()
            .map_err(|e| ViewError::server(Some(500), format!("Failed to acquire write lock: {}", e)))?
            .take();
        match injected {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn not_found(&self, id: &str) -> ViewError {
        ViewError::server(Some(404), format!("{} '{}' not found", self.resource.name, id))
    }

    /// Criteria equivalent to the server-side parameters
    fn criteria(&self, params: &QueryParams) -> FilterCriteria {
        let mut criteria = FilterCriteria::new().search(params.search.clone().unwrap_or_default());
        if let Some(status) = &params.status {
            criteria = criteria.exact("status", status.clone());
        }
        if let Some(category) = &params.category {
            criteria = criteria.exact("category", category.clone());
        }
        for (field, value) in &params.extra {
            criteria = criteria.exact(field.clone(), value.clone());
        }
        if let Some(date_field) = &self.resource.date_field {
            let bound = RangeBound {
                min: params.date_from.clone().map(Into::into),
                max: params.date_to.clone().map(Into::into),
            };
            criteria = criteria.within(date_field.clone(), bound);
        }
        criteria
    }
}

#[async_trait]
impl CollectionService for InMemoryCollectionService {
    fn resource(&self) -> &str {
        &self.resource.name
    }

    async fn fetch(&self, params: &QueryParams) -> Result<FetchedPage, ViewError> {
        self.begin().await?;

        let items = self.read()?;
        let engine = FilterEngine::new(self.resource.search_fields.clone());
        let criteria = self.criteria(params);
        let mut matching = engine.filter(items.as_slice(), &criteria);

        if let Some(field) = &params.sort_by {
            let expr = match params.sort_order {
                Some(order) => format!("{}:{}", field, order.as_str()),
                None => field.clone(),
            };
            if let Some(spec) = SortSpec::parse(&expr) {
                matching = sort(&matching, &spec);
            }
        }

        let total = matching.len();
        let limit = params.limit();
        let page_items: Vec<Item> = matching
            .into_iter()
            .skip((params.page() - 1) * limit)
            .take(limit)
            .cloned()
            .collect();

        Ok(FetchedPage {
            items: page_items,
            total_count: total,
            page_count: Some(total.div_ceil(limit)),
        })
    }

    async fn create(&self, body: Value) -> Result<MutationOutcome, ViewError> {
        self.begin().await?;

        let mut body = match body {
            Value::Object(map) => map,
            _ => return Err(ViewError::server(Some(400), "body must be a JSON object")),
        };
        body.entry(self.resource.id_field.clone())
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));

        let item = Item::from_json(Value::Object(body), &self.resource.id_field)?;
        let mut items = self.write()?;
        if items.iter().any(|i| i.id() == item.id()) {
            return Err(ViewError::server(
                Some(409),
                format!("{} '{}' already exists", self.resource.name, item.id),
            ));
        }
        items.push(item.clone());
        Ok(MutationOutcome::Item(item))
    }

    async fn update(&self, id: &str, patch: Value) -> Result<MutationOutcome, ViewError> {
        self.begin().await?;

        let mut items = self.write()?;
        let item = items
            .iter_mut()
            .find(|i| i.id() == id)
            .ok_or_else(|| self.not_found(id))?;
        item.merge_patch(&patch);
        Ok(MutationOutcome::Item(item.clone()))
    }

    async fn delete(&self, id: &str) -> Result<MutationOutcome, ViewError> {
        self.begin().await?;

        let mut items = self.write()?;
        let before = items.len();
        items.retain(|i| i.id() != id);
        if items.len() == before {
            return Err(self.not_found(id));
        }
        Ok(MutationOutcome::Done)
    }

    async fn action(
        &self,
        id: &str,
        action: &str,
        body: Option<Value>,
    ) -> Result<MutationOutcome, ViewError> {
        self.begin().await?;

        let items = self.read()?;
        if !items.iter().any(|i| i.id() == id) {
            return Err(self.not_found(id));
        }
        Ok(MutationOutcome::Value(json!({
            "id": id,
            "action": action,
            "body": body.unwrap_or(Value::Null),
        })))
    }
}
