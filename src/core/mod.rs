//! Core module containing the records, filters and contracts every view builds on

pub mod error;
pub mod events;
pub mod field;
pub mod filter;
pub mod pagination;
pub mod query;
pub mod record;
pub mod selection;
pub mod service;
pub mod sort;
pub mod status;

pub use error::ViewError;
pub use events::{CollectionEvent, EventBus, EventEnvelope};
pub use field::FieldValue;
pub use filter::{FilterCriteria, FilterEngine, RangeBound};
pub use pagination::{LoadMore, PageWindow, Pagination, Paginator};
pub use query::{PaginationMeta, QueryParams};
pub use record::{Item, Record};
pub use selection::SelectionSet;
pub use service::{CollectionService, FetchedPage, MutationOutcome};
pub use sort::{SortDirection, SortKey, SortSpec};
pub use status::StatusWorkflow;
