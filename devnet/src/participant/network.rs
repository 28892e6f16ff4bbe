use std::{collections::HashMap, sync::Arc};

use eyre::{Result, WrapErr};
use tokio::sync::Mutex;
use tracing::info;

use super::{BootstrapRole, Participant};
use crate::{
    cl::{ClClientLauncher, ClLaunchRequest},
    client::{ClClientType, ElClientType},
    config::{LogLevel, NetworkConfig, ParticipantSpec},
    el::{ElClientLauncher, ElLaunchRequest},
    error::ConfigError,
    genesis::GenesisArtifact,
    keystores::KeystoreAssignment,
};

/// Execution launchers keyed by the kind they start.
pub type ElLaunchers = HashMap<ElClientType, Arc<dyn ElClientLauncher>>;

/// Consensus launchers keyed by the kind they start.
pub type ClLaunchers = HashMap<ClClientType, Arc<dyn ClClientLauncher>>;

/// An append-only set of participants sharing one genesis.
///
/// Additions are serialized: the lock is held for the whole launch so ordinals stay
/// unique and every node sees the same bootstrap. The first participant added becomes
/// the bootstrap for all later ones.
#[derive(Debug)]
pub struct ParticipantNetwork {
    el_launchers: ElLaunchers,
    cl_launchers: ClLaunchers,
    network: NetworkConfig,
    genesis: GenesisArtifact,
    keystores: Vec<KeystoreAssignment>,
    global_log_level: LogLevel,
    participants: Mutex<Vec<Arc<Participant>>>,
}

impl ParticipantNetwork {
    /// Creates an empty network. `keystores[i]` is run by the participant with ordinal `i`.
    pub fn new(
        el_launchers: ElLaunchers,
        cl_launchers: ClLaunchers,
        network: NetworkConfig,
        genesis: GenesisArtifact,
        keystores: Vec<KeystoreAssignment>,
        global_log_level: LogLevel,
    ) -> Self {
        Self {
            el_launchers,
            cl_launchers,
            network,
            genesis,
            keystores,
            global_log_level,
            participants: Mutex::new(Vec::new()),
        }
    }

    /// Shared network parameters.
    pub const fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Genesis data every participant boots from.
    pub const fn genesis(&self) -> &GenesisArtifact {
        &self.genesis
    }

    /// Launches the EL then the CL of a new participant and appends it.
    ///
    /// Configuration problems (unregistered kind, no keystores left) are reported before
    /// anything starts. A participant whose EL started but whose CL failed is not
    /// appended and its EL keeps running.
    pub async fn add_participant(&self, spec: &ParticipantSpec) -> Result<Arc<Participant>> {
        let mut participants = self.participants.lock().await;
        let ordinal = participants.len();

        let el_launcher = self.el_launchers.get(&spec.el_client_type).ok_or_else(|| {
            ConfigError::UnregisteredLauncher {
                layer: "execution",
                kind: spec.el_client_type.to_string(),
            }
        })?;
        let cl_launcher = self.cl_launchers.get(&spec.cl_client_type).ok_or_else(|| {
            ConfigError::UnregisteredLauncher {
                layer: "consensus",
                kind: spec.cl_client_type.to_string(),
            }
        })?;
        let keystores =
            self.keystores.get(ordinal).ok_or(ConfigError::MissingKeystores(ordinal))?;

        let bootstrap = participants.first();

        let el_image = spec.el_image();
        let el = el_launcher
            .launch(ElLaunchRequest {
                ordinal,
                image: &el_image,
                log_level: spec.el_log_level(self.global_log_level),
                extra_params: &spec.el_extra_params,
                network: &self.network,
                genesis: &self.genesis,
                bootstrap: BootstrapRole::from_bootstrap(bootstrap.map(|p| p.el.as_ref())),
            })
            .await
            .wrap_err_with(|| {
                format!("Failed to launch {} for participant {ordinal}", spec.el_client_type)
            })?;

        let cl_image = spec.cl_image();
        let cl = cl_launcher
            .launch(ClLaunchRequest {
                ordinal,
                image: &cl_image,
                log_level: spec.cl_log_level(self.global_log_level),
                extra_params: &spec.cl_extra_params,
                network: &self.network,
                genesis: &self.genesis,
                el: &el,
                bootstrap: BootstrapRole::from_bootstrap(bootstrap.map(|p| p.cl.as_ref())),
                keystores,
            })
            .await
            .wrap_err_with(|| {
                format!("Failed to launch {} for participant {ordinal}", spec.cl_client_type)
            })?;

        let participant = Arc::new(Participant {
            ordinal,
            el_client_type: spec.el_client_type,
            cl_client_type: spec.cl_client_type,
            el: Arc::new(el),
            cl: Arc::new(cl),
        });
        participants.push(participant.clone());

        info!(
            ordinal,
            el = %participant.el_client_type,
            cl = %participant.cl_client_type,
            enode = %participant.el.enode,
            enr = %participant.cl.enr,
            "participant added"
        );

        Ok(participant)
    }

    /// Like [`Self::add_participant`], with client kinds given by name and default images.
    pub async fn add_participant_by_name(
        &self,
        el_client_type: &str,
        cl_client_type: &str,
    ) -> Result<Arc<Participant>> {
        let el_client_type: ElClientType = el_client_type.parse()?;
        let cl_client_type: ClClientType = cl_client_type.parse()?;
        self.add_participant(&ParticipantSpec::new(el_client_type, cl_client_type)).await
    }

    /// Snapshot of the participants added so far, in launch order.
    pub async fn participants(&self) -> Vec<Arc<Participant>> {
        self.participants.lock().await.clone()
    }

    /// Number of participants added so far.
    pub async fn len(&self) -> usize {
        self.participants.lock().await.len()
    }

    /// Whether no participant has been added yet.
    pub async fn is_empty(&self) -> bool {
        self.participants.lock().await.is_empty()
    }
}
