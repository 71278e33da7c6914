use crate::docker::ensure_daemon;
use crate::{Result, TestInfraError};
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const POSTGRES_PORT: u16 = 5432;

#[derive(TypedBuilder)]
pub struct PostgresConfig {
    #[builder(default = "16-alpine".to_string())]
    tag: String,
    #[builder(default = "shorty".to_string())]
    database: String,
    #[builder(default = "shorty".to_string())]
    username: String,
    #[builder(default = "shorty".to_string())]
    password: String,
}

/// Test fixture for a disposable Postgres server.
///
/// The container is removed when the fixture is dropped.
pub struct PostgresServer {
    container: ContainerAsync<GenericImage>,
    config: PostgresConfig,
}

impl PostgresServer {
    /// Starts a Postgres container suitable for integration tests.
    ///
    /// The server may still be finishing its init scripts when this returns,
    /// so callers should retry their first connection. Without a docker daemon
    /// this fails fast with [`TestInfraError::DockerUnavailable`].
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        ensure_daemon()?;

        let container = GenericImage::new("postgres", config.tag.as_str())
            .with_exposed_port(POSTGRES_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_DB", config.database.as_str())
            .with_env_var("POSTGRES_USER", config.username.as_str())
            .with_env_var("POSTGRES_PASSWORD", config.password.as_str())
            .start()
            .await
            .map_err(|source| TestInfraError::Start {
                image: format!("postgres:{}", config.tag),
                source,
            })?;

        Ok(Self { container, config })
    }

    pub async fn host(&self) -> Result<String> {
        Ok(self.container.get_host().await?.to_string())
    }

    pub async fn port(&self) -> Result<u16> {
        self.container
            .get_host_port_ipv4(POSTGRES_PORT)
            .await
            .map_err(|source| TestInfraError::Port {
                port: POSTGRES_PORT,
                source,
            })
    }

    pub async fn database_url(&self) -> Result<String> {
        let host = self.host().await?;
        let port = self.port().await?;
        Ok(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.config.username, self.config.password, host, port, self.config.database
        ))
    }

    /// Returns the underlying container reference.
    pub fn container(&self) -> &ContainerAsync<GenericImage> {
        &self.container
    }
}
