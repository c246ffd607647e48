//! Cancellable fetching of collection pages

use crate::core::error::ViewError;
use crate::core::query::QueryParams;
use crate::core::service::{CollectionService, FetchedPage};
use crate::view::in_flight::{InFlight, OperationKind};
use std::sync::Arc;

/// Issues collection queries on behalf of one view
///
/// Each call is one logical query. Starting a query aborts the one still in
/// flight, so only the newest query can complete. Nothing is retried.
#[derive(Clone)]
pub struct Fetcher {
    service: Arc<dyn CollectionService>,
    in_flight: Arc<InFlight>,
}

impl Fetcher {
    pub fn new(service: Arc<dyn CollectionService>, in_flight: Arc<InFlight>) -> Self {
        Self { service, in_flight }
    }

    pub fn resource(&self) -> &str {
        self.service.resource()
    }

    /// Fetch one page, returning the query id with it
    ///
    /// Fails with `ViewError::Cancelled` when a newer query started first.
    pub async fn fetch(&self, params: &QueryParams) -> Result<(u64, FetchedPage), ViewError> {
        let (query, result) = self
            .in_flight
            .run(OperationKind::Query, self.service.fetch(params))
            .await?;

        match result {
            Ok(page) => {
                tracing::debug!(
                    resource = self.resource(),
                    query,
                    items = page.items.len(),
                    total = page.total_count,
                    "Fetched collection"
                );
                Ok((query, page))
            }
            Err(err) => {
                tracing::warn!(resource = self.resource(), query, error = %err, "Fetch failed");
                Err(err)
            }
        }
    }

    /// Whether `query` is still the newest query
    pub fn is_current(&self, query: u64) -> bool {
        self.in_flight.is_latest_query(query)
    }
}
