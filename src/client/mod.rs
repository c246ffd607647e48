//! HTTP access to REST collection endpoints

pub mod envelope;
pub mod rest;

pub use rest::RestCollectionClient;
