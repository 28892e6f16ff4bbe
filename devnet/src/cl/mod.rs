//! Consensus-layer client launchers.
//!
//! Every kind implements [`ClClientLauncher`]. Beacon nodes become healthy once their
//! REST API answers `/eth/v1/node/health` with a known status and
//! `/eth/v1/node/identity` returns a non-empty ENR. Kinds with a separate validator
//! client start it after the beacon node, pointed at the beacon's private address.

use std::{collections::HashMap, net::IpAddr, sync::Arc};

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::{
    availability::RetryPolicy,
    client::ClClientType,
    config::{LogLevel, NetworkConfig},
    el::ElClientContext,
    genesis::GenesisArtifact,
    keystores::KeystoreAssignment,
    node::NodeStartup,
    participant::BootstrapRole,
    platform::{ServiceHandle, ServicePlatform, ServiceRequest},
    rpc::{BeaconClient, NodeIdentity},
    utils::{service_name, shell_script},
};

mod lighthouse;
pub use lighthouse::LighthouseLauncher;

mod lodestar;
pub use lodestar::LodestarLauncher;

mod nimbus;
pub use nimbus::NimbusLauncher;

mod prysm;
pub use prysm::PrysmLauncher;

mod teku;
pub use teku::TekuLauncher;

/// Mount point of the CL testnet directory.
pub const GENESIS_MOUNT: &str = "/cl-genesis";
/// Mount point of the shared JWT secret.
pub const JWT_MOUNT: &str = "/jwt/jwtsecret";
/// Mount point of the node's keystore tree.
pub const KEYSTORES_MOUNT: &str = "/validator-keys";
/// Beacon node data directory.
pub const BEACON_DATA_DIR: &str = "/consensus-data";
/// Validator client data directory.
pub const VALIDATOR_DATA_DIR: &str = "/validator-data";

/// Fee recipient for every validator. Premined by the genesis generator.
pub const FEE_RECIPIENT: &str = "0x878705ba3f8Bc32FCf7F4CAa1A35E72AF65CF766";

/// Everything a launcher needs to start one consensus client.
#[derive(Debug, Clone, Copy)]
pub struct ClLaunchRequest<'a> {
    /// Participant ordinal.
    pub ordinal: usize,
    /// Image to run. Prysm takes `beacon,validator`.
    pub image: &'a str,
    /// Requested verbosity.
    pub log_level: LogLevel,
    /// Extra flags appended to the beacon node.
    pub extra_params: &'a [String],
    /// Network parameters.
    pub network: &'a NetworkConfig,
    /// Generated genesis data.
    pub genesis: &'a GenesisArtifact,
    /// The execution client this node drives.
    pub el: &'a ElClientContext,
    /// Bootstrap or peer of the bootstrap beacon node.
    pub bootstrap: BootstrapRole<'a, ClClientContext>,
    /// Validator keys run by this node.
    pub keystores: &'a KeystoreAssignment,
}

impl ClLaunchRequest<'_> {
    /// ENR of the bootstrap beacon node, for peers.
    pub fn boot_enr(&self) -> Option<&str> {
        self.bootstrap.peer().map(|context| context.enr.as_str())
    }
}

/// A Prometheus scrape target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsEndpoint {
    /// Service exposing the metrics.
    pub service: String,
    /// Scrape URL on the devnet network.
    pub url: String,
}

/// A running, healthy consensus client. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClClientContext {
    /// Client kind.
    pub client_type: ClClientType,
    /// Client name, e.g. `lighthouse`.
    pub client_name: String,
    /// Beacon node service name.
    pub service_name: String,
    /// ENR as reported by the node itself.
    pub enr: String,
    /// libp2p peer id.
    pub peer_id: String,
    /// Beacon node address on the devnet network.
    pub private_ip: IpAddr,
    /// Beacon REST API port.
    pub http_port: u16,
    /// Host-reachable beacon REST API URL.
    pub beacon_url: Url,
    /// Validator client service name, for split kinds.
    pub validator_service_name: Option<String>,
    /// Metrics of every service of this node.
    pub metrics: Vec<MetricsEndpoint>,
}

impl ClClientContext {
    /// Beacon REST API URL on the devnet network.
    pub fn private_beacon_url(&self) -> String {
        format!("http://{}:{}", self.private_ip, self.http_port)
    }
}

/// Serializable view of a [`ClClientContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClClientSummary {
    /// Client kind.
    pub client_type: ClClientType,
    /// Beacon node service name.
    pub service_name: String,
    /// Validator client service name, if separate.
    pub validator_service_name: Option<String>,
    /// ENR.
    pub enr: String,
    /// Host-reachable beacon REST API URL.
    pub beacon_url: String,
    /// Metrics endpoints.
    pub metrics: Vec<MetricsEndpoint>,
}

impl From<&ClClientContext> for ClClientSummary {
    fn from(context: &ClClientContext) -> Self {
        Self {
            client_type: context.client_type,
            service_name: context.service_name.clone(),
            validator_service_name: context.validator_service_name.clone(),
            enr: context.enr.clone(),
            beacon_url: context.beacon_url.to_string(),
            metrics: context.metrics.clone(),
        }
    }
}

/// Launches one consensus client (beacon node plus validator) of a fixed kind.
#[async_trait]
pub trait ClClientLauncher: std::fmt::Debug + Send + Sync {
    /// The kind this launcher starts.
    fn client_type(&self) -> ClClientType;

    /// Starts the client, waits until the beacon node is healthy and returns its context.
    async fn launch(&self, request: ClLaunchRequest<'_>) -> Result<ClClientContext>;
}

/// Builds the launcher table for every supported CL kind.
pub fn default_cl_launchers(
    platform: Arc<dyn ServicePlatform>,
) -> HashMap<ClClientType, Arc<dyn ClClientLauncher>> {
    let launchers: [Arc<dyn ClClientLauncher>; 5] = [
        Arc::new(LighthouseLauncher::new(platform.clone())),
        Arc::new(LodestarLauncher::new(platform.clone())),
        Arc::new(NimbusLauncher::new(platform.clone())),
        Arc::new(PrysmLauncher::new(platform.clone())),
        Arc::new(TekuLauncher::new(platform)),
    ];
    launchers.into_iter().map(|launcher| (launcher.client_type(), launcher)).collect()
}

/// How a service's command line is passed to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Invocation {
    /// Run with `sh -c`, expanding the private IP placeholder.
    Shell(Vec<String>),
    /// Passed as-is to the image entrypoint. For images without a shell.
    Direct(Vec<String>),
}

/// One service of a consensus node.
#[derive(Debug)]
pub(crate) struct ClService {
    pub(crate) name: String,
    pub(crate) image: String,
    pub(crate) invocation: Invocation,
    pub(crate) ports: Vec<u16>,
}

impl ClService {
    fn into_request(self, launch: &ClLaunchRequest<'_>) -> ServiceRequest {
        let mut request = ServiceRequest::new(self.name, self.image)
            .with_mount(&launch.genesis.cl.dir, GENESIS_MOUNT)
            .with_mount(&launch.genesis.cl.jwt_secret_path, JWT_MOUNT)
            .with_mount(&launch.keystores.root, KEYSTORES_MOUNT);
        request = match self.invocation {
            Invocation::Shell(args) => request
                .with_entrypoint("sh")
                .with_cmd(vec!["-c".to_string(), shell_script(&args)]),
            Invocation::Direct(args) => request.with_cmd(args),
        };
        self.ports.into_iter().fold(request, ServiceRequest::with_port)
    }
}

/// A healthy beacon node.
#[derive(Debug)]
pub(crate) struct BeaconNode {
    pub(crate) handle: ServiceHandle,
    pub(crate) identity: NodeIdentity,
    pub(crate) beacon_url: Url,
}

/// Beacon service name for a participant.
pub(crate) fn beacon_service_name(request: &ClLaunchRequest<'_>, kind: ClClientType) -> String {
    service_name("cl", request.ordinal, kind)
}

/// Validator service name for a participant.
pub(crate) fn validator_service_name(request: &ClLaunchRequest<'_>, kind: ClClientType) -> String {
    format!("{}-validator", service_name("cl", request.ordinal, kind))
}

/// Starts a beacon node and waits until it reports health and a non-empty ENR.
pub(crate) async fn launch_beacon(
    platform: &dyn ServicePlatform,
    launch: &ClLaunchRequest<'_>,
    service: ClService,
    http_port: u16,
    policy: RetryPolicy,
) -> Result<BeaconNode> {
    let name = service.name.clone();
    let mut startup = NodeStartup::new(&name);

    let handle = startup
        .start(platform.launch(service.into_request(launch)))
        .await
        .wrap_err_with(|| format!("Failed to start {name}"))?;

    let beacon_url = startup.record(handle.host_url(http_port))?;
    let client = BeaconClient::new(beacon_url.clone());

    let identity = startup
        .await_health(policy, || {
            let client = client.clone();
            async move {
                let health = client.health().await?;
                debug!(?health, url = %client.base_url(), "beacon node responded");
                client.identity().await
            }
        })
        .await
        .wrap_err_with(|| format!("{name} did not become available"))?;

    Ok(BeaconNode { handle, identity, beacon_url })
}

/// Starts a validator client. Validators expose no readiness endpoint and are not polled.
pub(crate) async fn launch_validator(
    platform: &dyn ServicePlatform,
    launch: &ClLaunchRequest<'_>,
    service: ClService,
) -> Result<ServiceHandle> {
    let name = service.name.clone();
    let handle = platform
        .launch(service.into_request(launch))
        .await
        .wrap_err_with(|| format!("Failed to start {name}"))?;
    info!(service = %name, keys = launch.keystores.num_keys(), "validator client started");
    Ok(handle)
}

/// Assembles the context of a launched node.
pub(crate) fn build_context(
    kind: ClClientType,
    beacon: BeaconNode,
    http_port: u16,
    validator: Option<&ServiceHandle>,
    metrics: Vec<MetricsEndpoint>,
) -> ClClientContext {
    ClClientContext {
        client_type: kind,
        client_name: kind.to_string(),
        service_name: beacon.handle.name.clone(),
        enr: beacon.identity.enr,
        peer_id: beacon.identity.peer_id,
        private_ip: beacon.handle.private_ip,
        http_port,
        beacon_url: beacon.beacon_url,
        validator_service_name: validator.map(|handle| handle.name.clone()),
        metrics,
    }
}

/// Creates a metrics endpoint for `port` of `handle`.
pub(crate) fn metrics_endpoint(handle: &ServiceHandle, port: u16) -> MetricsEndpoint {
    MetricsEndpoint {
        service: handle.name.clone(),
        url: format!("{}/metrics", handle.private_url("http", port)),
    }
}


#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, net::Ipv4Addr};

    use strum::IntoEnumIterator;

    use super::{test_utils::*, *};
    use crate::{el::test_utils as el, platform::DockerPlatform};

    #[test]
    fn test_default_launchers_cover_every_kind() {
        let launchers = default_cl_launchers(Arc::new(DockerPlatform::default()));
        for kind in ClClientType::iter() {
            assert_eq!(launchers[&kind].client_type(), kind);
        }
    }

    #[test]
    fn test_service_request_mounts() {
        let network = el::network();
        let genesis = el::genesis();
        let el_context = el::el_context("enode://aa@1.2.3.4:30303");
        let keys = keystores(0..64);
        let launch = request(&network, &genesis, &el_context, BootstrapRole::Bootstrap, &keys);

        let service = ClService {
            name: "cl-1-teku".to_string(),
            image: "consensys/teku:22.11.0".to_string(),
            invocation: Invocation::Shell(vec!["teku".to_string()]),
            ports: vec![4000, 8008, 4000],
        };
        let request = service.into_request(&launch);

        assert_eq!(request.entrypoint.as_deref(), Some("sh"));
        assert_eq!(request.cmd, vec!["-c".to_string(), "'teku'".to_string()]);
        assert_eq!(request.ports, vec![4000, 8008]);
        let targets: Vec<_> = request.mounts.iter().map(|m| m.container_path.as_str()).collect();
        assert_eq!(targets, vec![GENESIS_MOUNT, JWT_MOUNT, KEYSTORES_MOUNT]);
    }

    #[test]
    fn test_build_context() {
        let handle = ServiceHandle {
            name: "cl-2-lodestar".to_string(),
            private_ip: IpAddr::V4(Ipv4Addr::new(172, 18, 0, 9)),
            host_ports: BTreeMap::new(),
        };
        let beacon = BeaconNode {
            handle: handle.clone(),
            identity: NodeIdentity {
                peer_id: "16Uiu2".to_string(),
                enr: "enr:-abc".to_string(),
                p2p_addresses: vec![],
            },
            beacon_url: Url::parse("http://127.0.0.1:50000").unwrap(),
        };
        let metrics = vec![metrics_endpoint(&handle, 8008)];
        let context = build_context(ClClientType::Lodestar, beacon, 4000, None, metrics);

        assert_eq!(context.client_name, "lodestar");
        assert_eq!(context.enr, "enr:-abc");
        assert_eq!(context.private_beacon_url(), "http://172.18.0.9:4000");
        assert_eq!(context.metrics[0].url, "http://172.18.0.9:8008/metrics");
    }
}
