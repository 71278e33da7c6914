//! Finds out whether a docker daemon is around before a container is requested.

use crate::{Result, TestInfraError};
use std::env;
use std::path::{Path, PathBuf};

const DOCKER_HOST_ENV: &str = "DOCKER_HOST";
const SYSTEM_SOCKET: &str = "/var/run/docker.sock";

/// Returns where the daemon is expected to listen.
pub fn ensure_daemon() -> Result<String> {
    let mut sockets = vec![PathBuf::from(SYSTEM_SOCKET)];
    if let Some(home) = env::var_os("HOME") {
        sockets.push(Path::new(&home).join(".docker/run/docker.sock"));
    }
    locate_daemon(env::var(DOCKER_HOST_ENV).ok(), &sockets)
}

fn locate_daemon(docker_host: Option<String>, sockets: &[PathBuf]) -> Result<String> {
    if let Some(host) = docker_host.filter(|host| !host.is_empty()) {
        return Ok(host);
    }
    sockets
        .iter()
        .find(|socket| socket.exists())
        .map(|socket| format!("unix://{}", socket.display()))
        .ok_or_else(|| TestInfraError::DockerUnavailable {
            searched: sockets.to_vec(),
        })
}
