use clap::{Parser, ValueEnum};
use jiff::SignedDuration;
use shorty_jobs::PoolConfig;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const FILE_STORAGE_PATH_ENV: &str = "FILE_STORAGE_PATH";
pub const DATABASE_DSN_ENV: &str = "DATABASE_DSN";
pub const DATABASE_CONNECT_TIMEOUT_ENV: &str = "DATABASE_CONNECT_TIMEOUT";
pub const DATABASE_QUERY_TIMEOUT_ENV: &str = "DATABASE_QUERY_TIMEOUT";
pub const DATABASE_MAX_CONNECTIONS_ENV: &str = "DATABASE_MAX_CONNECTIONS";
pub const BACKGROUND_WORKER_CONCURRENCY_ENV: &str = "BACKGROUND_WORKER_CONCURRENCY";
pub const BACKGROUND_JOB_TIMEOUT_ENV: &str = "BACKGROUND_JOB_TIMEOUT";
pub const BACKGROUND_ENQUEUE_TIMEOUT_ENV: &str = "BACKGROUND_ENQUEUE_TIMEOUT";
pub const GENERATOR_ENV: &str = "SHORTY_GENERATOR";
pub const LOG_FORMAT_ENV: &str = "SHORTY_LOG_FORMAT";

pub const DEFAULT_DATABASE_CONNECT_TIMEOUT: &str = "1s";
pub const DEFAULT_DATABASE_QUERY_TIMEOUT: &str = "1s";
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: &str = "5";
pub const DEFAULT_BACKGROUND_WORKER_CONCURRENCY: &str = "1";
pub const DEFAULT_BACKGROUND_JOB_TIMEOUT: &str = "1s";
pub const DEFAULT_BACKGROUND_ENQUEUE_TIMEOUT: &str = "2s";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorKind {
    #[value(name = "random")]
    Random,
    #[value(name = "hash")]
    Hash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

/// Where URL records live, decided once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { dsn: String },
    File { path: PathBuf },
    Memory,
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Postgres { .. } => write!(f, "postgres"),
            StorageBackend::File { path } => write!(f, "file ({})", path.display()),
            StorageBackend::Memory => write!(f, "in-memory"),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "shorty")]
pub struct Config {
    #[arg(short = 'f', long, env = FILE_STORAGE_PATH_ENV)]
    pub file_storage_path: Option<PathBuf>,

    #[arg(short = 'd', long, env = DATABASE_DSN_ENV)]
    pub database_dsn: Option<String>,

    #[arg(
        long,
        env = DATABASE_CONNECT_TIMEOUT_ENV,
        default_value = DEFAULT_DATABASE_CONNECT_TIMEOUT,
        value_parser = parse_duration,
    )]
    pub database_connect_timeout: Duration,

    #[arg(
        long,
        env = DATABASE_QUERY_TIMEOUT_ENV,
        default_value = DEFAULT_DATABASE_QUERY_TIMEOUT,
        value_parser = parse_duration,
    )]
    pub database_query_timeout: Duration,

    #[arg(
        long,
        env = DATABASE_MAX_CONNECTIONS_ENV,
        default_value = DEFAULT_DATABASE_MAX_CONNECTIONS,
    )]
    pub database_max_connections: u32,

    #[arg(
        long,
        env = BACKGROUND_WORKER_CONCURRENCY_ENV,
        default_value = DEFAULT_BACKGROUND_WORKER_CONCURRENCY,
    )]
    pub background_worker_concurrency: usize,

    #[arg(
        long,
        env = BACKGROUND_JOB_TIMEOUT_ENV,
        default_value = DEFAULT_BACKGROUND_JOB_TIMEOUT,
        value_parser = parse_duration,
    )]
    pub background_job_timeout: Duration,

    #[arg(
        long,
        env = BACKGROUND_ENQUEUE_TIMEOUT_ENV,
        default_value = DEFAULT_BACKGROUND_ENQUEUE_TIMEOUT,
        value_parser = parse_duration,
    )]
    pub background_enqueue_timeout: Duration,

    #[arg(
        long,
        env = GENERATOR_ENV,
        value_enum,
        default_value_t = GeneratorKind::Random
    )]
    pub generator: GeneratorKind,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,
}

impl Config {
    /// A database DSN wins over a file path; with neither, records stay in memory.
    /// Empty values count as unset.
    pub fn storage_backend(&self) -> StorageBackend {
        if let Some(dsn) = self.database_dsn.as_ref().filter(|dsn| !dsn.is_empty()) {
            return StorageBackend::Postgres { dsn: dsn.clone() };
        }
        if let Some(path) = self
            .file_storage_path
            .as_ref()
            .filter(|path| !path.as_os_str().is_empty())
        {
            return StorageBackend::File { path: path.clone() };
        }
        StorageBackend::Memory
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::builder()
            .concurrency(self.background_worker_concurrency)
            .job_timeout(self.background_job_timeout)
            .enqueue_timeout(self.background_enqueue_timeout)
            .build()
    }
}

/// Accepts friendly durations (`1s`, `500ms`, `1m 30s`) and ISO 8601 (`PT1S`).
fn parse_duration(value: &str) -> Result<Duration, String> {
    let duration: SignedDuration = value
        .parse()
        .map_err(|err| format!("invalid duration `{value}`: {err}"))?;
    Duration::try_from(duration).map_err(|_| format!("duration `{value}` must not be negative"))
}
