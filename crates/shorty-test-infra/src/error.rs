use std::path::PathBuf;
use std::result::Result as StdResult;
use testcontainers::TestcontainersError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("no docker daemon: DOCKER_HOST is unset and none of {searched:?} exists")]
    DockerUnavailable { searched: Vec<PathBuf> },

    #[error("failed to start {image}: {source}")]
    Start {
        image: String,
        #[source]
        source: TestcontainersError,
    },

    #[error("container port {port} is not mapped: {source}")]
    Port {
        port: u16,
        #[source]
        source: TestcontainersError,
    },

    #[error("container error: {0}")]
    Container(#[from] TestcontainersError),
}

impl TestInfraError {
    /// Tests skip instead of failing when this is true.
    pub fn is_docker_unavailable(&self) -> bool {
        matches!(self, TestInfraError::DockerUnavailable { .. })
    }
}

pub type Result<T> = StdResult<T, TestInfraError>;
