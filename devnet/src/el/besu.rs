use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use eyre::Result;

use super::{
    DATA_DIR, DISCOVERY_PORT, ElClientContext, ElClientLauncher, ElLaunchRequest, ElPorts,
    ElService, GENESIS_MOUNT, JWT_MOUNT, MiningWaiter, launch_el_service,
};
use crate::{
    availability::RetryPolicy, client::ElClientType, config::LogLevelTable,
    platform::ServicePlatform, utils::PRIVATE_IP,
};

const PORTS: ElPorts = ElPorts { rpc: 8545, ws: 8546, engine: 8551 };

/// Besu is a JVM client and regularly needs close to a minute to open its RPC port.
pub const BESU_HEALTH_POLICY: RetryPolicy = RetryPolicy::new(60, Duration::from_secs(1));

const LOG_LEVELS: LogLevelTable = LogLevelTable::UPPERCASE;

const RPC_APIS: &str = "ADMIN,CLIQUE,ETH,NET,DEBUG,TXPOOL,ENGINE";

/// Launches hyperledger besu.
#[derive(Debug)]
pub struct BesuLauncher {
    platform: Arc<dyn ServicePlatform>,
}

impl BesuLauncher {
    /// Creates a launcher starting services on `platform`.
    pub fn new(platform: Arc<dyn ServicePlatform>) -> Self {
        Self { platform }
    }

    /// Command line of the besu binary.
    pub fn command(request: &ElLaunchRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "exec".to_string(),
            "besu".to_string(),
            format!("--logging={}", LOG_LEVELS.get(request.log_level)),
            format!("--data-path={DATA_DIR}"),
            format!("--genesis-file={GENESIS_MOUNT}/besu.json"),
            format!("--network-id={}", request.network.network_id),
            "--host-allowlist=*".to_string(),
            "--rpc-http-enabled=true".to_string(),
            "--rpc-http-host=0.0.0.0".to_string(),
            format!("--rpc-http-port={}", PORTS.rpc),
            format!("--rpc-http-api={RPC_APIS}"),
            "--rpc-http-cors-origins=*".to_string(),
            "--rpc-ws-enabled=true".to_string(),
            "--rpc-ws-host=0.0.0.0".to_string(),
            format!("--rpc-ws-port={}", PORTS.ws),
            format!("--rpc-ws-api={RPC_APIS}"),
            "--p2p-enabled=true".to_string(),
            format!("--p2p-host={PRIVATE_IP}"),
            format!("--p2p-port={DISCOVERY_PORT}"),
            "--engine-rpc-enabled=true".to_string(),
            format!("--engine-rpc-port={}", PORTS.engine),
            format!("--engine-jwt-secret={JWT_MOUNT}"),
            "--engine-host-allowlist=*".to_string(),
            "--sync-mode=FULL".to_string(),
        ];
        if let Some(enode) = request.bootnode() {
            args.push(format!("--bootnodes={enode}"));
        }
        args.extend(request.extra_params.iter().cloned());
        args
    }
}

#[async_trait]
impl ElClientLauncher for BesuLauncher {
    fn client_type(&self) -> ElClientType {
        ElClientType::Besu
    }

    async fn launch(&self, request: ElLaunchRequest<'_>) -> Result<ElClientContext> {
        let service = ElService {
            client_type: ElClientType::Besu,
            ports: PORTS,
            args: Self::command(&request),
            health_policy: BESU_HEALTH_POLICY,
        };
        launch_el_service(self.platform.as_ref(), &request, service, |_| MiningWaiter::Disabled)
            .await
    }
}
