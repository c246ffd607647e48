//! Application context: one HTTP client and event bus shared by every view

use crate::client::RestCollectionClient;
use crate::config::{ClientConfig, ResourceConfig};
use crate::core::error::ViewError;
use crate::core::events::EventBus;
use crate::core::service::CollectionService;
use crate::view::CollectionView;
use crate::view::in_flight::InFlight;
use reqwest::Client;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Shared state for the views of one application
///
/// # Example
///
/// ```ignore
/// let ctx = AppContext::new(ClientConfig::from_yaml_file("dashboard.yaml")?)?;
/// let materials = ctx.view("materials")?;
/// materials.refresh().await?;
/// ```
pub struct AppContext {
    config: ClientConfig,
    http: Client,
    events: EventBus,
    views: Mutex<Vec<Weak<InFlight>>>,
}

impl AppContext {
    pub fn new(config: ClientConfig) -> Result<Self, ViewError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ViewError::Config {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        tracing::info!(
            base_url = %config.base_url,
            resources = config.resources.len(),
            "Application context ready"
        );

        Ok(Self {
            events: EventBus::new(config.event_capacity),
            config,
            http,
            views: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn views(&self) -> MutexGuard<'_, Vec<Weak<InFlight>>> {
        self.views.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build a REST-backed view for a configured resource
    pub fn view(&self, name: &str) -> Result<CollectionView, ViewError> {
        let resource = self.config.resource(name).cloned().ok_or_else(|| ViewError::Config {
            message: format!("unknown resource '{}'", name),
        })?;
        let client = RestCollectionClient::new(self.http.clone(), &self.config.base_url, resource.clone());
        Ok(self.view_with(Arc::new(client), resource))
    }

    /// Build a view over any collection service
    pub fn view_with(&self, service: Arc<dyn CollectionService>, resource: ResourceConfig) -> CollectionView {
        let page_size = self.config.page_size_for(&resource);
        let view = CollectionView::new(service, resource, page_size).with_events(self.events.clone());

        let mut views = self.views();
        views.retain(|v| v.strong_count() > 0);
        views.push(Arc::downgrade(view.in_flight()));
        view
    }

    /// Abort every request of every live view and refuse new ones
    pub fn shutdown(&self) {
        let views = std::mem::take(&mut *self.views());
        let mut closed = 0;
        for in_flight in views.iter().filter_map(Weak::upgrade) {
            in_flight.close();
            closed += 1;
        }
        tracing::info!(views = closed, "Application context shut down");
    }
}

/// Install a `tracing` subscriber honoring `RUST_LOG`
///
/// Falls back to `default_filter` when `RUST_LOG` is unset. Calling this more
/// than once is harmless.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
