//! End-to-end devnet construction: genesis, keystores, then participants in order.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use eyre::{Result, WrapErr};
use tracing::info;

use crate::{
    cl::default_cl_launchers,
    config::{ParticipantSpec, TestnetParams},
    el::default_el_launchers,
    genesis::{GenesisPaths, GenesisTemplates, generate_genesis, genesis_timestamp},
    keystores::generate_keystores,
    participant::{ClLaunchers, ElLaunchers, Participant, ParticipantNetwork},
    platform::{DockerPlatform, ServicePlatform},
    prelaunch::PrelaunchEnvironment,
    summary::{NetworkSummary, ParticipantSummary, SUMMARY_FILE},
};

/// Builder for a [`Testnet`].
#[derive(Debug)]
pub struct TestnetBuilder {
    params: TestnetParams,
    output_dir: PathBuf,
    platform: Option<Arc<dyn ServicePlatform>>,
    templates: GenesisTemplates,
    launchers: Option<(ElLaunchers, ClLaunchers)>,
}

impl TestnetBuilder {
    /// Creates a builder writing all generated data below `output_dir`.
    pub fn new(params: TestnetParams, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            params,
            output_dir: output_dir.into(),
            platform: None,
            templates: GenesisTemplates::default(),
            launchers: None,
        }
    }

    /// Runs services on `platform` instead of a Docker platform built from the params.
    pub fn with_platform(mut self, platform: Arc<dyn ServicePlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Overrides the embedded genesis generator templates.
    pub fn with_templates(mut self, templates: GenesisTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Overrides the launcher tables. Defaults cover every supported kind.
    pub fn with_launchers(mut self, el: ElLaunchers, cl: ClLaunchers) -> Self {
        self.launchers = Some((el, cl));
        self
    }

    /// Generates genesis and keystores, then launches every participant in order.
    ///
    /// Parameters are validated before any service starts.
    pub async fn build(self) -> Result<Testnet> {
        let config = self.params.validate().wrap_err("Invalid testnet parameters")?;
        let launch = &self.params.launch;

        let platform: Arc<dyn ServicePlatform> = match self.platform {
            Some(platform) => platform,
            None => Arc::new(DockerPlatform::default().with_stable_names(launch.stable_names)),
        };

        let prelaunch =
            PrelaunchEnvironment::start(platform.clone(), &launch.prelaunch_image, &self.output_dir)
                .await?;

        let timestamp = genesis_timestamp(Duration::from_secs(launch.genesis_delay_secs))?;
        let genesis = generate_genesis(&prelaunch, &self.templates, &config, timestamp)
            .await
            .wrap_err("Failed to generate genesis data")?;

        let keystores = generate_keystores(
            &prelaunch,
            &config.validator_mnemonic,
            config.total_validator_keys()?,
            config.num_participants,
        )
        .await
        .wrap_err("Failed to generate validator keystores")?;

        let (el_launchers, cl_launchers) = self.launchers.unwrap_or_else(|| {
            (default_el_launchers(platform.clone()), default_cl_launchers(platform.clone()))
        });

        let network = ParticipantNetwork::new(
            el_launchers,
            cl_launchers,
            config,
            genesis,
            keystores,
            launch.global_client_log_level,
        );

        for spec in &self.params.participants {
            network.add_participant(spec).await?;
        }

        let participants = network.participants().await;
        if launch.wait_for_mining
            && let Some(bootstrap) = participants.first()
        {
            bootstrap
                .el
                .mining_waiter
                .wait_for_mining()
                .await
                .wrap_err("Bootstrap execution client did not start mining")?;
        }

        info!(participants = participants.len(), dir = %prelaunch.host_dir().display(), "devnet started");

        Ok(Testnet { platform, output_dir: prelaunch.host_dir().to_path_buf(), network })
    }
}

/// A running devnet. Services stay up while the platform is alive.
#[derive(Debug)]
pub struct Testnet {
    platform: Arc<dyn ServicePlatform>,
    output_dir: PathBuf,
    network: ParticipantNetwork,
}

impl Testnet {
    /// Platform running the services.
    pub fn platform(&self) -> &Arc<dyn ServicePlatform> {
        &self.platform
    }

    /// Directory holding genesis, keystores and the summary.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The participant network.
    pub const fn network(&self) -> &ParticipantNetwork {
        &self.network
    }

    /// Launches one more participant after the initial set.
    pub async fn add_participant(&self, spec: &ParticipantSpec) -> Result<Arc<Participant>> {
        self.network.add_participant(spec).await
    }

    /// Collects identities and endpoints of every participant.
    pub async fn summary(&self) -> NetworkSummary {
        let participants = self.network.participants().await;
        NetworkSummary {
            network_id: self.network.network().network_id,
            genesis: GenesisPaths::from(self.network.genesis()),
            participants: participants
                .iter()
                .map(|participant| ParticipantSummary::from(participant.as_ref()))
                .collect(),
        }
    }

    /// Writes the summary to `network.json` in the output directory and returns its path.
    pub async fn write_summary(&self) -> Result<PathBuf> {
        let path = self.output_dir.join(SUMMARY_FILE);
        self.summary().await.write_to_file(&path)?;
        Ok(path)
    }
}
