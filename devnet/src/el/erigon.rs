use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use eyre::Result;

use super::{
    DATA_DIR, DISCOVERY_PORT, ElClientContext, ElClientLauncher, ElLaunchRequest, ElPorts,
    ElService, GENESIS_MOUNT, JWT_MOUNT, MiningWaiter, launch_el_service,
};
use crate::{
    availability::RetryPolicy,
    client::ElClientType,
    config::LogLevelTable,
    platform::ServicePlatform,
    utils::{AND_THEN, PRIVATE_IP},
};

/// Erigon serves WebSocket on the HTTP port.
const PORTS: ElPorts = ElPorts { rpc: 8545, ws: 8545, engine: 8551 };

/// Erigon binds its RPC daemon about as fast as geth.
pub const ERIGON_HEALTH_POLICY: RetryPolicy = RetryPolicy::new(20, Duration::from_secs(1));

const VERBOSITY: LogLevelTable = LogLevelTable::NUMERIC;

/// Launches erigon from the geth-format genesis.
#[derive(Debug)]
pub struct ErigonLauncher {
    platform: Arc<dyn ServicePlatform>,
}

impl ErigonLauncher {
    /// Creates a launcher starting services on `platform`.
    pub fn new(platform: Arc<dyn ServicePlatform>) -> Self {
        Self { platform }
    }

    /// Command line: initialize the datadir, then run the node with static peering.
    pub fn command(request: &ElLaunchRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "erigon".to_string(),
            "init".to_string(),
            format!("--datadir={DATA_DIR}"),
            format!("{GENESIS_MOUNT}/erigon.json"),
            AND_THEN.to_string(),
            "exec".to_string(),
            "erigon".to_string(),
            format!("--log.console.verbosity={}", VERBOSITY.get(request.log_level)),
            format!("--datadir={DATA_DIR}"),
            format!("--networkid={}", request.network.network_id),
            format!("--port={DISCOVERY_PORT}"),
            "--http".to_string(),
            "--http.addr=0.0.0.0".to_string(),
            format!("--http.port={}", PORTS.rpc),
            "--http.vhosts=*".to_string(),
            "--http.corsdomain=*".to_string(),
            "--http.api=admin,engine,net,eth".to_string(),
            "--ws".to_string(),
            "--allow-insecure-unlock".to_string(),
            format!("--nat=extip:{PRIVATE_IP}"),
            "--authrpc.addr=0.0.0.0".to_string(),
            format!("--authrpc.port={}", PORTS.engine),
            "--authrpc.vhosts=*".to_string(),
            format!("--authrpc.jwtsecret={JWT_MOUNT}"),
        ];
        if let Some(enode) = request.bootnode() {
            args.push("--nodiscover".to_string());
            args.push(format!("--staticpeers={enode}"));
        }
        args.extend(request.extra_params.iter().cloned());
        args
    }
}

#[async_trait]
impl ElClientLauncher for ErigonLauncher {
    fn client_type(&self) -> ElClientType {
        ElClientType::Erigon
    }

    async fn launch(&self, request: ElLaunchRequest<'_>) -> Result<ElClientContext> {
        let service = ElService {
            client_type: ElClientType::Erigon,
            ports: PORTS,
            args: Self::command(&request),
            health_policy: ERIGON_HEALTH_POLICY,
        };
        launch_el_service(self.platform.as_ref(), &request, service, |_| MiningWaiter::Disabled)
            .await
    }
}
