//! The narrow container-platform surface the orchestrator depends on.
//!
//! Orchestration code only ever launches a service and executes commands inside a
//! running one. [`DockerPlatform`] implements this over testcontainers; tests provide
//! in-memory fakes.

use std::{collections::BTreeMap, fmt, net::IpAddr, path::PathBuf};

use async_trait::async_trait;
use eyre::{Result, eyre};
use url::Url;

mod docker;
pub use docker::DockerPlatform;

pub mod network;

/// A host directory bind-mounted into a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    /// Absolute path on the host.
    pub host_path: PathBuf,
    /// Mount point inside the service.
    pub container_path: String,
}

/// Everything needed to start one service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceRequest {
    /// Logical service name. The platform may suffix it to form the container name.
    pub name: String,
    /// Image reference in `name:tag` form.
    pub image: String,
    /// Entrypoint override.
    pub entrypoint: Option<String>,
    /// Command arguments.
    pub cmd: Vec<String>,
    /// TCP ports exposed by the service.
    pub ports: Vec<u16>,
    /// Host directories mounted into the service.
    pub mounts: Vec<BindMount>,
}

impl ServiceRequest {
    /// Creates a request for the given service name and image.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self { name: name.into(), image: image.into(), ..Default::default() }
    }

    /// Overrides the image entrypoint.
    pub fn with_entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    /// Sets the command arguments.
    pub fn with_cmd(mut self, cmd: Vec<String>) -> Self {
        self.cmd = cmd;
        self
    }

    /// Exposes a TCP port.
    pub fn with_port(mut self, port: u16) -> Self {
        if !self.ports.contains(&port) {
            self.ports.push(port);
        }
        self
    }

    /// Bind-mounts a host path into the service.
    pub fn with_mount(
        mut self,
        host_path: impl Into<PathBuf>,
        container_path: impl Into<String>,
    ) -> Self {
        self.mounts
            .push(BindMount { host_path: host_path.into(), container_path: container_path.into() });
        self
    }
}

/// A running service as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandle {
    /// Container name as registered with the platform.
    pub name: String,
    /// Address other services on the network use to reach this one.
    pub private_ip: IpAddr,
    /// Host-reachable `host:port` for every exposed container port.
    pub host_ports: BTreeMap<u16, String>,
}

impl ServiceHandle {
    /// Returns a host-reachable HTTP URL for an exposed container port.
    pub fn host_url(&self, container_port: u16) -> Result<Url> {
        let authority = self
            .host_ports
            .get(&container_port)
            .ok_or_else(|| eyre!("port {container_port} is not exposed by {}", self.name))?;
        Ok(Url::parse(&format!("http://{authority}"))?)
    }

    /// Returns the in-network URL for a container port.
    pub fn private_url(&self, scheme: &str, container_port: u16) -> String {
        format!("{scheme}://{}:{container_port}", self.private_ip)
    }
}

/// Result of executing a command inside a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Process exit code.
    pub exit_code: i64,
    /// Combined stdout and stderr.
    pub output: String,
}

impl ExecOutput {
    /// Returns `true` when the command exited with code zero.
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

impl fmt::Display for ExecOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit code {}: {}", self.exit_code, self.output)
    }
}

/// Capability consumed from the container orchestration platform.
#[async_trait]
pub trait ServicePlatform: fmt::Debug + Send + Sync + 'static {
    /// Starts a service. Failures here are never retried by the caller.
    async fn launch(&self, request: ServiceRequest) -> Result<ServiceHandle>;

    /// Runs `cmd` inside a running service and waits for it to exit.
    async fn exec(&self, service: &ServiceHandle, cmd: Vec<String>) -> Result<ExecOutput>;
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn test_host_url() {
        let handle = ServiceHandle {
            name: "el-0-geth".to_string(),
            private_ip: IpAddr::V4(Ipv4Addr::new(172, 18, 0, 2)),
            host_ports: BTreeMap::from([(8545, "127.0.0.1:49153".to_string())]),
        };

        assert_eq!(handle.host_url(8545).unwrap().as_str(), "http://127.0.0.1:49153/");
        assert!(handle.host_url(8551).is_err());
        assert_eq!(handle.private_url("http", 8551), "http://172.18.0.2:8551");
    }

    #[test]
    fn test_with_port_deduplicates() {
        let request = ServiceRequest::new("svc", "img:1").with_port(8545).with_port(8545);
        assert_eq!(request.ports, vec![8545]);
    }
}
