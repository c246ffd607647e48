//! Collection views: fetch, derive and mutate one resource's list

pub mod collection;
pub mod fetcher;
pub mod in_flight;
pub mod mutation;

pub use collection::CollectionView;
pub use fetcher::Fetcher;
pub use in_flight::{InFlight, OperationKind};
pub use mutation::{Mutation, MutationCoordinator, UpdatePolicy};
