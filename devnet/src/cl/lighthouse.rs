use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use eyre::Result;

use super::{
    BEACON_DATA_DIR, ClClientContext, ClClientLauncher, ClLaunchRequest, ClService,
    FEE_RECIPIENT, GENESIS_MOUNT, Invocation, JWT_MOUNT, KEYSTORES_MOUNT, beacon_service_name,
    build_context, launch_beacon, launch_validator, metrics_endpoint, validator_service_name,
};
use crate::{
    availability::RetryPolicy, client::ClClientType, config::LogLevelTable,
    platform::ServicePlatform, utils::PRIVATE_IP,
};

const BEACON_HTTP_PORT: u16 = 4000;
const BEACON_DISCOVERY_PORT: u16 = 9000;
const BEACON_METRICS_PORT: u16 = 5054;
const VALIDATOR_HTTP_PORT: u16 = 5042;
const VALIDATOR_METRICS_PORT: u16 = 5064;

/// The beacon node only serves its identity once its libp2p stack is bound.
pub const LIGHTHOUSE_HEALTH_POLICY: RetryPolicy = RetryPolicy::new(60, Duration::from_secs(1));

const LOG_LEVELS: LogLevelTable = LogLevelTable::LOWERCASE;

/// Launches a lighthouse beacon node and a lighthouse validator client.
#[derive(Debug)]
pub struct LighthouseLauncher {
    platform: Arc<dyn ServicePlatform>,
}

impl LighthouseLauncher {
    /// Creates a launcher starting services on `platform`.
    pub fn new(platform: Arc<dyn ServicePlatform>) -> Self {
        Self { platform }
    }

    /// Beacon node command line.
    pub fn beacon_command(request: &ClLaunchRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "lighthouse".to_string(),
            "beacon_node".to_string(),
            format!("--debug-level={}", LOG_LEVELS.get(request.log_level)),
            format!("--datadir={BEACON_DATA_DIR}"),
            format!("--testnet-dir={GENESIS_MOUNT}"),
            "--disable-enr-auto-update".to_string(),
            format!("--enr-address={PRIVATE_IP}"),
            format!("--enr-udp-port={BEACON_DISCOVERY_PORT}"),
            format!("--enr-tcp-port={BEACON_DISCOVERY_PORT}"),
            "--listen-address=0.0.0.0".to_string(),
            format!("--port={BEACON_DISCOVERY_PORT}"),
            "--http".to_string(),
            "--http-address=0.0.0.0".to_string(),
            format!("--http-port={BEACON_HTTP_PORT}"),
            "--http-allow-sync-stalled".to_string(),
            "--disable-packet-filter".to_string(),
            format!("--execution-endpoints={}", request.el.engine_url()),
            format!("--jwt-secrets={JWT_MOUNT}"),
            format!("--suggested-fee-recipient={FEE_RECIPIENT}"),
            "--subscribe-all-subnets".to_string(),
            "--metrics".to_string(),
            "--metrics-address=0.0.0.0".to_string(),
            "--metrics-allow-origin=*".to_string(),
            format!("--metrics-port={BEACON_METRICS_PORT}"),
        ];
        if let Some(enr) = request.boot_enr() {
            args.push(format!("--boot-nodes={enr}"));
        }
        args.extend(request.extra_params.iter().cloned());
        args
    }

    /// Validator client command line, connected to `beacon_url`.
    pub fn validator_command(request: &ClLaunchRequest<'_>, beacon_url: &str) -> Vec<String> {
        vec![
            "lighthouse".to_string(),
            "validator_client".to_string(),
            format!("--debug-level={}", LOG_LEVELS.get(request.log_level)),
            format!("--testnet-dir={GENESIS_MOUNT}"),
            format!("--validators-dir={KEYSTORES_MOUNT}/keys"),
            format!("--secrets-dir={KEYSTORES_MOUNT}/secrets"),
            "--init-slashing-protection".to_string(),
            "--http".to_string(),
            "--unencrypted-http-transport".to_string(),
            "--http-address=0.0.0.0".to_string(),
            format!("--http-port={VALIDATOR_HTTP_PORT}"),
            format!("--beacon-nodes={beacon_url}"),
            format!("--suggested-fee-recipient={FEE_RECIPIENT}"),
            "--metrics".to_string(),
            "--metrics-address=0.0.0.0".to_string(),
            "--metrics-allow-origin=*".to_string(),
            format!("--metrics-port={VALIDATOR_METRICS_PORT}"),
        ]
    }
}

#[async_trait]
impl ClClientLauncher for LighthouseLauncher {
    fn client_type(&self) -> ClClientType {
        ClClientType::Lighthouse
    }

    async fn launch(&self, request: ClLaunchRequest<'_>) -> Result<ClClientContext> {
        let kind = ClClientType::Lighthouse;
        let beacon_service = ClService {
            name: beacon_service_name(&request, kind),
            image: request.image.to_string(),
            invocation: Invocation::Shell(Self::beacon_command(&request)),
            ports: vec![BEACON_HTTP_PORT, BEACON_DISCOVERY_PORT, BEACON_METRICS_PORT],
        };
        let beacon = launch_beacon(
            self.platform.as_ref(),
            &request,
            beacon_service,
            BEACON_HTTP_PORT,
            LIGHTHOUSE_HEALTH_POLICY,
        )
        .await?;

        let beacon_url = beacon.handle.private_url("http", BEACON_HTTP_PORT);
        let validator_service = ClService {
            name: validator_service_name(&request, kind),
            image: request.image.to_string(),
            invocation: Invocation::Shell(Self::validator_command(&request, &beacon_url)),
            ports: vec![VALIDATOR_HTTP_PORT, VALIDATOR_METRICS_PORT],
        };
        let validator =
            launch_validator(self.platform.as_ref(), &request, validator_service).await?;

        let metrics = vec![
            metrics_endpoint(&beacon.handle, BEACON_METRICS_PORT),
            metrics_endpoint(&validator, VALIDATOR_METRICS_PORT),
        ];
        Ok(build_context(kind, beacon, BEACON_HTTP_PORT, Some(&validator), metrics))
    }
}
