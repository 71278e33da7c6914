//! Wires configuration, storage, background jobs and id generation into a
//! running shortener.

mod app;
pub mod config;
pub mod error;
pub mod telemetry;

pub use app::App;
pub use config::{Config, GeneratorKind, LogFormat, StorageBackend};
pub use error::AppError;
