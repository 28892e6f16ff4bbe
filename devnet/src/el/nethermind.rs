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

/// Nethermind is usually up within 20 seconds.
pub const NETHERMIND_HEALTH_POLICY: RetryPolicy = RetryPolicy::new(20, Duration::from_secs(1));

const LOG_LEVELS: LogLevelTable = LogLevelTable::UPPERCASE;

/// Launches nethermind from the generated chainspec.
#[derive(Debug)]
pub struct NethermindLauncher {
    platform: Arc<dyn ServicePlatform>,
}

impl NethermindLauncher {
    /// Creates a launcher starting services on `platform`.
    pub fn new(platform: Arc<dyn ServicePlatform>) -> Self {
        Self { platform }
    }

    /// Command line of the runner binary.
    pub fn command(request: &ElLaunchRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "exec".to_string(),
            "/nethermind/Nethermind.Runner".to_string(),
            "--config=kiln".to_string(),
            format!("--log={}", LOG_LEVELS.get(request.log_level)),
            format!("--datadir={DATA_DIR}"),
            format!("--Init.ChainSpecPath={GENESIS_MOUNT}/chainspec.json"),
            "--Init.WebSocketsEnabled=true".to_string(),
            "--Init.DiagnosticMode=None".to_string(),
            "--JsonRpc.Enabled=true".to_string(),
            "--JsonRpc.EnabledModules=net,eth,consensus,subscribe,web3,admin".to_string(),
            "--JsonRpc.Host=0.0.0.0".to_string(),
            format!("--JsonRpc.Port={}", PORTS.rpc),
            format!("--JsonRpc.WebSocketsPort={}", PORTS.ws),
            "--JsonRpc.EngineHost=0.0.0.0".to_string(),
            format!("--JsonRpc.EnginePort={}", PORTS.engine),
            format!("--JsonRpc.JwtSecretFile={JWT_MOUNT}"),
            format!("--Network.ExternalIp={PRIVATE_IP}"),
            format!("--Network.LocalIp={PRIVATE_IP}"),
            format!("--Network.DiscoveryPort={DISCOVERY_PORT}"),
            format!("--Network.P2PPort={DISCOVERY_PORT}"),
        ];
        if let Some(enode) = request.bootnode() {
            args.push(format!("--Discovery.Bootnodes={enode}"));
            args.push(format!("--Network.StaticPeers={enode}"));
        }
        args.extend(request.extra_params.iter().cloned());
        args
    }
}

#[async_trait]
impl ElClientLauncher for NethermindLauncher {
    fn client_type(&self) -> ElClientType {
        ElClientType::Nethermind
    }

    async fn launch(&self, request: ElLaunchRequest<'_>) -> Result<ElClientContext> {
        let service = ElService {
            client_type: ElClientType::Nethermind,
            ports: PORTS,
            args: Self::command(&request),
            health_policy: NETHERMIND_HEALTH_POLICY,
        };
        launch_el_service(self.platform.as_ref(), &request, service, |_| MiningWaiter::Disabled)
            .await
    }
}
