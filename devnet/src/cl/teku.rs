use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use eyre::Result;

use super::{
    BEACON_DATA_DIR, ClClientContext, ClClientLauncher, ClLaunchRequest, ClService,
    FEE_RECIPIENT, GENESIS_MOUNT, Invocation, JWT_MOUNT, KEYSTORES_MOUNT, beacon_service_name,
    build_context, launch_beacon, metrics_endpoint,
};
use crate::{
    availability::RetryPolicy, client::ClClientType, config::LogLevelTable,
    platform::ServicePlatform, utils::PRIVATE_IP,
};

const HTTP_PORT: u16 = 4000;
const DISCOVERY_PORT: u16 = 9000;
const METRICS_PORT: u16 = 8008;

/// Teku is the slowest to start: JVM warm-up plus keystore decryption for every key.
pub const TEKU_HEALTH_POLICY: RetryPolicy = RetryPolicy::new(200, Duration::from_secs(1));

const LOG_LEVELS: LogLevelTable = LogLevelTable::UPPERCASE;

/// Launches teku, which runs beacon node and validators in one process.
#[derive(Debug)]
pub struct TekuLauncher {
    platform: Arc<dyn ServicePlatform>,
}

impl TekuLauncher {
    /// Creates a launcher starting services on `platform`.
    pub fn new(platform: Arc<dyn ServicePlatform>) -> Self {
        Self { platform }
    }

    /// Command line of the teku binary.
    pub fn command(request: &ClLaunchRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "exec".to_string(),
            "/opt/teku/bin/teku".to_string(),
            format!("--logging={}", LOG_LEVELS.get(request.log_level)),
            "--log-destination=CONSOLE".to_string(),
            format!("--network={GENESIS_MOUNT}/config.yaml"),
            format!("--initial-state={GENESIS_MOUNT}/genesis.ssz"),
            format!("--data-path={BEACON_DATA_DIR}"),
            "--data-storage-mode=PRUNE".to_string(),
            "--p2p-enabled=true".to_string(),
            "--p2p-peer-lower-bound=1".to_string(),
            format!("--p2p-advertised-ip={PRIVATE_IP}"),
            "--p2p-discovery-site-local-addresses-enabled".to_string(),
            format!("--p2p-port={DISCOVERY_PORT}"),
            "--rest-api-enabled=true".to_string(),
            "--rest-api-docs-enabled=true".to_string(),
            "--rest-api-interface=0.0.0.0".to_string(),
            format!("--rest-api-port={HTTP_PORT}"),
            "--rest-api-host-allowlist=*".to_string(),
            "--data-storage-non-canonical-blocks-enabled=true".to_string(),
            format!("--ee-jwt-secret-file={JWT_MOUNT}"),
            format!("--ee-endpoint={}", request.el.engine_url()),
            format!("--validators-proposer-default-fee-recipient={FEE_RECIPIENT}"),
            format!(
                "--validator-keys={KEYSTORES_MOUNT}/teku-keys:{KEYSTORES_MOUNT}/teku-secrets"
            ),
            "--validators-keystore-locking-enabled=false".to_string(),
            "--metrics-enabled".to_string(),
            "--metrics-interface=0.0.0.0".to_string(),
            "--metrics-host-allowlist=*".to_string(),
            format!("--metrics-port={METRICS_PORT}"),
        ];
        if let Some(enr) = request.boot_enr() {
            args.push(format!("--p2p-discovery-bootnodes={enr}"));
        }
        args.extend(request.extra_params.iter().cloned());
        args
    }
}

#[async_trait]
impl ClClientLauncher for TekuLauncher {
    fn client_type(&self) -> ClClientType {
        ClClientType::Teku
    }

    async fn launch(&self, request: ClLaunchRequest<'_>) -> Result<ClClientContext> {
        let kind = ClClientType::Teku;
        let service = ClService {
            name: beacon_service_name(&request, kind),
            image: request.image.to_string(),
            invocation: Invocation::Shell(Self::command(&request)),
            ports: vec![HTTP_PORT, DISCOVERY_PORT, METRICS_PORT],
        };
        let beacon =
            launch_beacon(self.platform.as_ref(), &request, service, HTTP_PORT, TEKU_HEALTH_POLICY)
                .await?;

        let metrics = vec![metrics_endpoint(&beacon.handle, METRICS_PORT)];
        Ok(build_context(kind, beacon, HTTP_PORT, None, metrics))
    }
}
