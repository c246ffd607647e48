//! Collection service backends that live outside HTTP

pub mod in_memory;

pub use in_memory::InMemoryCollectionService;
