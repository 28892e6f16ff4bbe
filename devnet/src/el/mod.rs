//! Execution-layer client launchers.
//!
//! Every kind implements [`ElClientLauncher`]. Launchers share one startup flow
//! ([`launch_el_service`]): create the service once, then poll `admin_nodeInfo` under the
//! kind's retry budget. The node's enode is always read back from the running node.

use std::{collections::HashMap, net::IpAddr, sync::Arc};

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    availability::RetryPolicy,
    client::ElClientType,
    config::{LogLevel, NetworkConfig},
    genesis::GenesisArtifact,
    node::NodeStartup,
    participant::BootstrapRole,
    platform::{ServicePlatform, ServiceRequest},
    rpc::ElRpcClient,
    utils::{service_name, shell_script},
};

mod besu;
pub use besu::BesuLauncher;

mod erigon;
pub use erigon::ErigonLauncher;

mod geth;
pub use geth::GethLauncher;

mod mining;
pub use mining::MiningWaiter;

mod nethermind;
pub use nethermind::NethermindLauncher;

/// Mount point of the EL genesis directory.
pub const GENESIS_MOUNT: &str = "/el-genesis";
/// Mount point of the shared JWT secret.
pub const JWT_MOUNT: &str = "/jwt/jwtsecret";
/// Execution client data directory.
pub const DATA_DIR: &str = "/execution-data";

/// Execution client P2P port, identical across kinds.
pub const DISCOVERY_PORT: u16 = 30303;

/// Everything a launcher needs to start one execution client.
#[derive(Debug, Clone, Copy)]
pub struct ElLaunchRequest<'a> {
    /// Participant ordinal.
    pub ordinal: usize,
    /// Image to run.
    pub image: &'a str,
    /// Requested verbosity.
    pub log_level: LogLevel,
    /// Extra flags appended verbatim.
    pub extra_params: &'a [String],
    /// Network parameters.
    pub network: &'a NetworkConfig,
    /// Generated genesis data.
    pub genesis: &'a GenesisArtifact,
    /// Bootstrap or peer of the bootstrap EL.
    pub bootstrap: BootstrapRole<'a, ElClientContext>,
}

impl ElLaunchRequest<'_> {
    /// Enode of the bootstrap node, for peers.
    pub fn bootnode(&self) -> Option<&str> {
        self.bootstrap.peer().map(|context| context.enode.as_str())
    }
}

/// A running, healthy execution client. Immutable once built.
#[derive(Debug, Clone)]
pub struct ElClientContext {
    /// Client kind.
    pub client_type: ElClientType,
    /// Service name.
    pub service_name: String,
    /// ENR, for kinds that expose one.
    pub enr: Option<String>,
    /// Enode as reported by the node itself.
    pub enode: String,
    /// Address on the devnet network.
    pub private_ip: IpAddr,
    /// JSON-RPC HTTP port.
    pub rpc_port: u16,
    /// JSON-RPC WebSocket port.
    pub ws_port: u16,
    /// Engine API port.
    pub engine_port: u16,
    /// Host-reachable JSON-RPC URL.
    pub rpc_url: Url,
    /// Blocks until the node has mined its first block.
    pub mining_waiter: MiningWaiter,
}

impl ElClientContext {
    /// Engine API URL on the devnet network.
    pub fn engine_url(&self) -> String {
        format!("http://{}:{}", self.private_ip, self.engine_port)
    }

    /// JSON-RPC URL on the devnet network.
    pub fn private_rpc_url(&self) -> String {
        format!("http://{}:{}", self.private_ip, self.rpc_port)
    }

    /// JSON-RPC WebSocket URL on the devnet network.
    pub fn private_ws_url(&self) -> String {
        format!("ws://{}:{}", self.private_ip, self.ws_port)
    }
}

/// Serializable view of an [`ElClientContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElClientSummary {
    /// Client kind.
    pub client_type: ElClientType,
    /// Service name.
    pub service_name: String,
    /// Enode.
    pub enode: String,
    /// ENR, if exposed.
    pub enr: Option<String>,
    /// Host-reachable JSON-RPC URL.
    pub rpc_url: String,
    /// Engine API URL on the devnet network.
    pub engine_url: String,
}

impl From<&ElClientContext> for ElClientSummary {
    fn from(context: &ElClientContext) -> Self {
        Self {
            client_type: context.client_type,
            service_name: context.service_name.clone(),
            enode: context.enode.clone(),
            enr: context.enr.clone(),
            rpc_url: context.rpc_url.to_string(),
            engine_url: context.engine_url(),
        }
    }
}

/// Launches one execution client of a fixed kind.
#[async_trait]
pub trait ElClientLauncher: std::fmt::Debug + Send + Sync {
    /// The kind this launcher starts.
    fn client_type(&self) -> ElClientType;

    /// Starts the client, waits until it answers `admin_nodeInfo` and returns its context.
    async fn launch(&self, request: ElLaunchRequest<'_>) -> Result<ElClientContext>;
}

/// Builds the launcher table for every supported EL kind.
pub fn default_el_launchers(
    platform: Arc<dyn ServicePlatform>,
) -> HashMap<ElClientType, Arc<dyn ElClientLauncher>> {
    let launchers: [Arc<dyn ElClientLauncher>; 4] = [
        Arc::new(GethLauncher::new(platform.clone())),
        Arc::new(ErigonLauncher::new(platform.clone())),
        Arc::new(NethermindLauncher::new(platform.clone())),
        Arc::new(BesuLauncher::new(platform)),
    ];
    launchers.into_iter().map(|launcher| (launcher.client_type(), launcher)).collect()
}

/// Ports one EL kind listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ElPorts {
    pub(crate) rpc: u16,
    pub(crate) ws: u16,
    pub(crate) engine: u16,
}

/// Kind-specific inputs of [`launch_el_service`].
#[derive(Debug)]
pub(crate) struct ElService {
    pub(crate) client_type: ElClientType,
    pub(crate) ports: ElPorts,
    /// Shell command line, run with `sh -c`.
    pub(crate) args: Vec<String>,
    pub(crate) health_policy: RetryPolicy,
}

/// Creates the service, waits for `admin_nodeInfo` and assembles the context.
pub(crate) async fn launch_el_service(
    platform: &dyn ServicePlatform,
    request: &ElLaunchRequest<'_>,
    service: ElService,
    mining_waiter: impl FnOnce(ElRpcClient) -> MiningWaiter,
) -> Result<ElClientContext> {
    let name = service_name("el", request.ordinal, service.client_type);
    let ports = service.ports;

    let service_request = ServiceRequest::new(&name, request.image)
        .with_entrypoint("sh")
        .with_cmd(vec!["-c".to_string(), shell_script(&service.args)])
        .with_port(ports.rpc)
        .with_port(ports.ws)
        .with_port(ports.engine)
        .with_port(DISCOVERY_PORT)
        .with_mount(&request.genesis.el.dir, GENESIS_MOUNT)
        .with_mount(&request.genesis.el.jwt_secret_path, JWT_MOUNT);

    let mut startup = NodeStartup::new(&name);
    let handle = startup
        .start(platform.launch(service_request))
        .await
        .wrap_err_with(|| format!("Failed to start {name}"))?;

    let rpc_url = startup.record(handle.host_url(ports.rpc))?;
    let client = ElRpcClient::new(rpc_url.clone());

    let node_info = startup
        .await_health(service.health_policy, || {
            let client = client.clone();
            async move { client.node_info().await }
        })
        .await
        .wrap_err_with(|| format!("{name} did not become available"))?;

    Ok(ElClientContext {
        client_type: service.client_type,
        service_name: name,
        enr: node_info.enr.filter(|enr| !enr.is_empty()),
        enode: node_info.enode,
        private_ip: handle.private_ip,
        rpc_port: ports.rpc,
        ws_port: ports.ws,
        engine_port: ports.engine,
        rpc_url,
        mining_waiter: mining_waiter(client),
    })
}
