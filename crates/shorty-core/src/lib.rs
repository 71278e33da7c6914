//! Core types and traits for the shorty URL shortener.
//!
//! This crate provides the record model, the [`UrlStore`] contract every
//! storage backend implements, and the shared error taxonomy.

pub mod error;
pub mod model;
pub mod store;

pub use error::{Result, StoreError};
pub use model::{BatchItem, UrlRecord};
pub use store::UrlStore;
