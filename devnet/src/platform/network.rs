//! The Docker bridge network every devnet service joins.

use std::process::Output;

use eyre::{Result, WrapErr, ensure};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Default Docker network shared by all devnet services.
pub const DEFAULT_NETWORK_NAME: &str = "merge-devnet";

async fn docker_network(action: &str, name: &str) -> Result<Output> {
    Command::new("docker")
        .args(["network", action, name])
        .output()
        .await
        .wrap_err_with(|| format!("Failed to run docker network {action} {name}"))
}

/// Creates the named network unless it already exists.
pub async fn ensure_network_exists(name: &str) -> Result<()> {
    if docker_network("inspect", name).await?.status.success() {
        debug!(network = name, "docker network already exists");
        return Ok(());
    }

    let output = docker_network("create", name).await?;
    ensure!(
        output.status.success(),
        "Failed to create Docker network {name}: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );

    info!(network = name, "created docker network");
    Ok(())
}

/// Removes the named network. A network that is missing or still in use is left alone.
pub async fn cleanup_network(name: &str) {
    match docker_network("rm", name).await {
        Ok(output) if output.status.success() => info!(network = name, "removed docker network"),
        Ok(output) => warn!(
            network = name,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "docker network was not removed"
        ),
        Err(err) => warn!(network = name, error = %err, "docker network was not removed"),
    }
}
