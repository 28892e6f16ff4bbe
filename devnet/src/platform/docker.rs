//! [`ServicePlatform`] backed by Docker via testcontainers.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use eyre::{Result, WrapErr, bail, eyre};
use testcontainers::{
    ContainerAsync, GenericImage, ImageExt, TestcontainersError,
    core::{CmdWaitFor, ExecCommand, ExecResult, IntoContainerPort, Mount},
    runners::AsyncRunner,
};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use super::{
    ExecOutput, ServiceHandle, ServicePlatform, ServiceRequest,
    network::{DEFAULT_NETWORK_NAME, ensure_network_exists},
};
use crate::unique_name;

/// Runs every service as a container on one shared Docker network.
///
/// Containers are stopped and removed when the platform is dropped.
#[derive(Debug)]
pub struct DockerPlatform {
    network: String,
    use_stable_names: bool,
    network_ready: OnceCell<()>,
    containers: Mutex<ContainerRegistry<ContainerAsync<GenericImage>>>,
}

/// Running containers keyed by container name.
///
/// An entry is never replaced: dropping a `ContainerAsync` removes the container.
#[derive(Debug)]
struct ContainerRegistry<T> {
    entries: HashMap<String, T>,
}

impl<T> Default for ContainerRegistry<T> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<T> ContainerRegistry<T> {
    fn ensure_vacant(&self, name: &str) -> Result<()> {
        if self.entries.contains_key(name) {
            bail!("a container named {name} is already running on this platform");
        }
        Ok(())
    }

    fn insert(&mut self, name: String, container: T) -> Result<()> {
        self.ensure_vacant(&name)?;
        self.entries.insert(name, container);
        Ok(())
    }

    fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }
}

impl Default for DockerPlatform {
    fn default() -> Self {
        Self::new(DEFAULT_NETWORK_NAME)
    }
}

impl DockerPlatform {
    /// Creates a platform attaching services to the named network.
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            use_stable_names: false,
            network_ready: OnceCell::new(),
            containers: Mutex::default(),
        }
    }

    /// Uses service names verbatim as container names instead of suffixing them.
    pub const fn with_stable_names(mut self, use_stable_names: bool) -> Self {
        self.use_stable_names = use_stable_names;
        self
    }

    /// Returns the Docker network name.
    pub fn network(&self) -> &str {
        &self.network
    }

    fn container_name(&self, service: &str) -> String {
        if self.use_stable_names { service.to_string() } else { unique_name(service) }
    }
}

#[async_trait]
impl ServicePlatform for DockerPlatform {
    async fn launch(&self, request: ServiceRequest) -> Result<ServiceHandle> {
        self.network_ready.get_or_try_init(|| ensure_network_exists(&self.network)).await?;

        let (image_name, image_tag) = request
            .image
            .rsplit_once(':')
            .ok_or_else(|| eyre!("image `{}` is missing a tag", request.image))?;

        let mut image = GenericImage::new(image_name, image_tag);
        if let Some(entrypoint) = &request.entrypoint {
            image = image.with_entrypoint(entrypoint);
        }
        for port in &request.ports {
            image = image.with_exposed_port(port.tcp());
        }

        let container_name = self.container_name(&request.name);
        self.containers.lock().await.ensure_vacant(&container_name)?;

        let mut container_request = image
            .with_container_name(&container_name)
            .with_network(&self.network)
            .with_cmd(request.cmd.clone());

        for mount in &request.mounts {
            container_request = container_request.with_mount(Mount::bind_mount(
                mount.host_path.to_string_lossy().to_string(),
                &mount.container_path,
            ));
        }

        debug!(service = %request.name, container = %container_name, image = %request.image, "starting container");
        let container = container_request
            .start()
            .await
            .wrap_err_with(|| format!("Failed to start container for {}", request.name))?;

        let private_ip = container
            .get_bridge_ip_address()
            .await
            .wrap_err("Failed to resolve container private address")?;
        let host = container.get_host().await.wrap_err("Failed to resolve container host")?;

        let mut host_ports = BTreeMap::new();
        for port in &request.ports {
            let host_port = container
                .get_host_port_ipv4(*port)
                .await
                .wrap_err_with(|| format!("Failed to resolve host port for {port}"))?;
            host_ports.insert(*port, format!("{host}:{host_port}"));
        }

        info!(service = %request.name, %private_ip, "container started");

        self.containers.lock().await.insert(container_name.clone(), container)?;

        Ok(ServiceHandle { name: container_name, private_ip, host_ports })
    }

    async fn exec(&self, service: &ServiceHandle, cmd: Vec<String>) -> Result<ExecOutput> {
        let containers = self.containers.lock().await;
        let container = containers
            .get(&service.name)
            .ok_or_else(|| eyre!("service {} is not running", service.name))?;

        let result = container
            .exec(exec_command(cmd))
            .await
            .wrap_err_with(|| format!("Failed to exec in {}", service.name))?;
        drop(containers);

        let (output, exit_code) = collect_exec_result(result)
            .await
            .wrap_err_with(|| format!("Failed to read exec result from {}", service.name))?;
        let exit_code = exit_code
            .ok_or_else(|| eyre!("exec in {} finished without an exit code", service.name))?;

        Ok(ExecOutput { exit_code, output })
    }
}

/// Builds an exec that only returns once the command has exited.
fn exec_command(cmd: Vec<String>) -> ExecCommand {
    ExecCommand::new(cmd).with_cmd_ready_condition(CmdWaitFor::exit())
}

/// Drains the output streams and reads the exit code of a finished exec.
///
/// `ExecResult` is not `Sync`, so it is read to completion on a blocking-pool thread.
async fn collect_exec_result(mut result: ExecResult) -> Result<(String, Option<i64>)> {
    let runtime = tokio::runtime::Handle::current();
    let (stdout, stderr, exit_code) = tokio::task::spawn_blocking(move || {
        runtime.block_on(async move {
            let stdout = result.stdout_to_vec().await?;
            let stderr = result.stderr_to_vec().await?;
            let exit_code = result.exit_code().await?;
            Ok::<_, TestcontainersError>((stdout, stderr, exit_code))
        })
    })
    .await
    .wrap_err("Exec reader task failed")??;

    let mut output = String::from_utf8_lossy(&stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&stderr));
    Ok((output, exit_code))
}
