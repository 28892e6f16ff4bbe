//! The long-lived service that hosts the genesis and keystore generation tools.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use eyre::{Result, WrapErr};
use tracing::{debug, info};

use crate::{
    error::ExternalToolError,
    platform::{ServiceHandle, ServicePlatform, ServiceRequest},
};

/// Mount point of the host output directory inside the generator service.
pub const CONTAINER_DATA_DIR: &str = "/data";

const PRELAUNCH_SERVICE_NAME: &str = "prelaunch-data-generator";

/// A running generator service with the host output directory mounted at
/// [`CONTAINER_DATA_DIR`].
///
/// Commands run one at a time and every artifact lands in the shared directory, so the
/// host can read what the tools produced. A network build owns exactly one of these.
#[derive(Debug)]
pub struct PrelaunchEnvironment {
    platform: Arc<dyn ServicePlatform>,
    service: ServiceHandle,
    host_dir: PathBuf,
}

impl PrelaunchEnvironment {
    /// Starts the generator service with `host_dir` mounted as its data directory.
    pub async fn start(
        platform: Arc<dyn ServicePlatform>,
        image: &str,
        host_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        std::fs::create_dir_all(host_dir.as_ref()).wrap_err("Failed to create output dir")?;
        let host_dir =
            host_dir.as_ref().canonicalize().wrap_err("Failed to canonicalize output dir path")?;

        let request = ServiceRequest::new(PRELAUNCH_SERVICE_NAME, image)
            .with_entrypoint("sleep")
            .with_cmd(vec!["infinity".to_string()])
            .with_mount(&host_dir, CONTAINER_DATA_DIR);

        let service = platform
            .launch(request)
            .await
            .wrap_err("Failed to start prelaunch data generator")?;

        info!(service = %service.name, dir = %host_dir.display(), "prelaunch data generator started");

        Ok(Self { platform, service, host_dir })
    }

    /// Host path of the shared data directory.
    pub fn host_dir(&self) -> &Path {
        &self.host_dir
    }

    /// Host path of `relative` inside the shared directory.
    pub fn host_path(&self, relative: &str) -> PathBuf {
        self.host_dir.join(relative)
    }

    /// Generator-side path of `relative` inside the shared directory.
    pub fn container_path(&self, relative: &str) -> String {
        format!("{CONTAINER_DATA_DIR}/{relative}")
    }

    /// Runs a shell command in the generator and returns its output.
    ///
    /// Any non-zero exit is an [`ExternalToolError`] carrying the output verbatim.
    pub async fn run(&self, script: &str) -> Result<String> {
        debug!(%script, "running generation command");

        let cmd = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
        let output = self
            .platform
            .exec(&self.service, cmd)
            .await
            .wrap_err_with(|| format!("Failed to exec `{script}` in prelaunch generator"))?;

        if !output.success() {
            return Err(ExternalToolError {
                command: script.to_string(),
                exit_code: output.exit_code,
                output: output.output,
            }
            .into());
        }

        Ok(output.output)
    }

    /// Creates `relative` (and its parents) inside the shared directory.
    pub fn create_dir(&self, relative: &str) -> Result<PathBuf> {
        let path = self.host_path(relative);
        std::fs::create_dir_all(&path)
            .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
        Ok(path)
    }
}
