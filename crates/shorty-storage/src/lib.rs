//! Storage backends for the shorty URL shortener.
//!
//! Three interchangeable implementations of [`UrlStore`]:
//! - [`MemoryStore`]: process-local maps behind a single reader/writer lock
//! - [`FileStore`]: the memory store plus a JSON snapshot written on close
//! - [`PostgresStore`]: a single `urls` table whose indexes enforce dedup

mod index;
pub mod file;
pub mod memory;
pub mod postgres;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use shorty_core::{BatchItem, Result, StoreError, UrlRecord, UrlStore};
