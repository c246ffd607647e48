//! # Collection View
//!
//! A client-side engine for the list pages of a REST-backed dashboard.
//!
//! ## Features
//!
//! - **Fetching**: cancellable requests; only the newest query commits
//! - **Filtering**: free-text search, exact matches and inclusive ranges, AND-combined
//! - **Sorting**: by field or by the sum of several numeric fields, stable
//! - **Pagination**: numbered pages or "load more", client- or server-side
//! - **Selection**: per-item toggle, select-all with toggle semantics, aggregates
//! - **Mutations**: create, update, delete, status transitions and actions, then refetch
//! - **Configuration-Based**: describe resources and envelopes in YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use collection_view::prelude::*;
//!
//! let ctx = AppContext::new(ClientConfig::from_yaml_file("dashboard.yaml")?)?;
//! let materials = ctx.view("materials")?;
//!
//! materials.refresh().await?;
//! materials.set_search("steel");
//! materials.set_sort(SortSpec::parse("currentStock:asc"));
//! materials.select_all_visible();
//!
//! let shortfall = materials.aggregate_selected(|m| {
//!     let field = |name| m.field_value(name).and_then(|v| v.as_f64()).unwrap_or(0.0);
//!     (field("reorderPoint") - field("currentStock")).max(0.0)
//! });
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod core;
pub mod storage;
pub mod view;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        error::ViewError,
        events::{CollectionEvent, EventBus, EventEnvelope},
        field::FieldValue,
        filter::{FilterCriteria, FilterEngine, RangeBound},
        pagination::{LoadMore, PageWindow, Pagination, Paginator},
        query::{PaginationMeta, QueryParams},
        record::{Item, Record},
        selection::SelectionSet,
        service::{CollectionService, FetchedPage, MutationOutcome},
        sort::{SortDirection, SortKey, SortSpec},
        status::StatusWorkflow,
    };

    // === Views ===
    pub use crate::view::{CollectionView, Mutation, UpdatePolicy};

    // === Backends ===
    pub use crate::client::RestCollectionClient;
    pub use crate::storage::InMemoryCollectionService;

    // === Config ===
    pub use crate::config::{ClientConfig, EnvelopeShape, PaginationMode, ResourceConfig, UpdateMethod};
    pub use crate::context::{AppContext, init_tracing};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
}
