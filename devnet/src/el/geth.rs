use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use eyre::Result;

use super::{
    DATA_DIR, DISCOVERY_PORT, ElClientContext, ElClientLauncher, ElLaunchRequest, ElPorts,
    ElService, GENESIS_MOUNT, JWT_MOUNT, MiningWaiter, launch_el_service,
};
use crate::{
    availability::RetryPolicy, client::ElClientType, config::LogLevelTable,
    platform::ServicePlatform,
    utils::{AND_THEN, PRIVATE_IP},
};

const PORTS: ElPorts = ElPorts { rpc: 8545, ws: 8546, engine: 8551 };

/// geth answers `admin_nodeInfo` within a few seconds of starting.
pub const GETH_HEALTH_POLICY: RetryPolicy = RetryPolicy::new(20, Duration::from_secs(1));

/// Mining the first PoW block includes DAG generation, which takes minutes.
pub const GETH_MINING_POLICY: RetryPolicy = RetryPolicy::new(120, Duration::from_secs(5));

const VERBOSITY: LogLevelTable = LogLevelTable::NUMERIC;

/// Account credited with mined blocks. Premined by the genesis generator.
const MINING_ETHERBASE: &str = "0x878705ba3f8Bc32FCf7F4CAa1A35E72AF65CF766";

/// Launches geth. The only EL kind that mines up to the merge.
#[derive(Debug)]
pub struct GethLauncher {
    platform: Arc<dyn ServicePlatform>,
}

impl GethLauncher {
    /// Creates a launcher starting services on `platform`.
    pub fn new(platform: Arc<dyn ServicePlatform>) -> Self {
        Self { platform }
    }

    /// Command line: initialize the datadir from the genesis, then run the node.
    pub fn command(request: &ElLaunchRequest<'_>) -> Vec<String> {
        let genesis = format!("{GENESIS_MOUNT}/geth.json");
        let mut args = vec![
            "geth".to_string(),
            "init".to_string(),
            format!("--datadir={DATA_DIR}"),
            genesis,
            AND_THEN.to_string(),
            "exec".to_string(),
            "geth".to_string(),
            format!("--verbosity={}", VERBOSITY.get(request.log_level)),
            format!("--datadir={DATA_DIR}"),
            format!("--networkid={}", request.network.network_id),
            "--http".to_string(),
            "--http.addr=0.0.0.0".to_string(),
            format!("--http.port={}", PORTS.rpc),
            "--http.vhosts=*".to_string(),
            "--http.corsdomain=*".to_string(),
            "--http.api=admin,engine,net,eth".to_string(),
            "--ws".to_string(),
            "--ws.addr=0.0.0.0".to_string(),
            format!("--ws.port={}", PORTS.ws),
            "--ws.api=engine,net,eth".to_string(),
            "--ws.origins=*".to_string(),
            "--allow-insecure-unlock".to_string(),
            format!("--nat=extip:{PRIVATE_IP}"),
            format!("--port={DISCOVERY_PORT}"),
            "--authrpc.addr=0.0.0.0".to_string(),
            format!("--authrpc.port={}", PORTS.engine),
            "--authrpc.vhosts=*".to_string(),
            format!("--authrpc.jwtsecret={JWT_MOUNT}"),
            "--syncmode=full".to_string(),
            "--mine".to_string(),
            format!("--miner.etherbase={MINING_ETHERBASE}"),
            "--miner.threads=1".to_string(),
        ];
        if let Some(enode) = request.bootnode() {
            args.push(format!("--bootnodes={enode}"));
        }
        args.extend(request.extra_params.iter().cloned());
        args
    }
}

#[async_trait]
impl ElClientLauncher for GethLauncher {
    fn client_type(&self) -> ElClientType {
        ElClientType::Geth
    }

    async fn launch(&self, request: ElLaunchRequest<'_>) -> Result<ElClientContext> {
        let service = ElService {
            client_type: ElClientType::Geth,
            ports: PORTS,
            args: Self::command(&request),
            health_policy: GETH_HEALTH_POLICY,
        };
        launch_el_service(self.platform.as_ref(), &request, service, |client| {
            MiningWaiter::BlockHeight { client, policy: GETH_MINING_POLICY }
        })
        .await
    }
}
