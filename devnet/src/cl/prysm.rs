use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use eyre::Result;

use super::{
    BEACON_DATA_DIR, ClClientContext, ClClientLauncher, ClLaunchRequest, ClService,
    FEE_RECIPIENT, GENESIS_MOUNT, Invocation, JWT_MOUNT, KEYSTORES_MOUNT, VALIDATOR_DATA_DIR,
    beacon_service_name, build_context, launch_beacon, launch_validator, metrics_endpoint,
    validator_service_name,
};
use crate::{
    availability::RetryPolicy, client::ClClientType, config::LogLevelTable, error::ConfigError,
    platform::ServicePlatform,
};

const BEACON_RPC_PORT: u16 = 4000;
const BEACON_HTTP_PORT: u16 = 3500;
const BEACON_TCP_DISCOVERY_PORT: u16 = 13000;
const BEACON_UDP_DISCOVERY_PORT: u16 = 12000;
const METRICS_PORT: u16 = 8080;

/// The gRPC gateway serving the beacon API comes up after the RPC server.
pub const PRYSM_HEALTH_POLICY: RetryPolicy = RetryPolicy::new(60, Duration::from_secs(1));

const LOG_LEVELS: LogLevelTable = LogLevelTable::LOWERCASE;

/// Launches a prysm beacon node and a prysm validator client.
///
/// Prysm ships separate images for both, passed as `beacon_image,validator_image`. The
/// images contain no shell, so arguments go straight to their entrypoints.
#[derive(Debug)]
pub struct PrysmLauncher {
    platform: Arc<dyn ServicePlatform>,
}

/// Splits the `beacon,validator` image pair.
pub fn split_images(image: &str) -> Result<(&str, &str), ConfigError> {
    match image.split(',').map(str::trim).collect::<Vec<_>>()[..] {
        [beacon, validator] if !beacon.is_empty() && !validator.is_empty() => {
            Ok((beacon, validator))
        }
        _ => Err(ConfigError::InvalidParameter {
            name: "cl_client_image",
            reason: format!("prysm expects `beacon_image,validator_image`, got `{image}`"),
        }),
    }
}

impl PrysmLauncher {
    /// Creates a launcher starting services on `platform`.
    pub fn new(platform: Arc<dyn ServicePlatform>) -> Self {
        Self { platform }
    }

    /// Beacon node arguments.
    pub fn beacon_command(request: &ClLaunchRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "--accept-terms-of-use=true".to_string(),
            format!("--datadir={BEACON_DATA_DIR}"),
            format!("--chain-config-file={GENESIS_MOUNT}/config.yaml"),
            format!("--genesis-state={GENESIS_MOUNT}/genesis.ssz"),
            format!("--execution-endpoint={}", request.el.engine_url()),
            "--rpc-host=0.0.0.0".to_string(),
            format!("--rpc-port={BEACON_RPC_PORT}"),
            "--grpc-gateway-host=0.0.0.0".to_string(),
            "--grpc-gateway-corsdomain=*".to_string(),
            format!("--grpc-gateway-port={BEACON_HTTP_PORT}"),
            format!("--p2p-tcp-port={BEACON_TCP_DISCOVERY_PORT}"),
            format!("--p2p-udp-port={BEACON_UDP_DISCOVERY_PORT}"),
            "--min-sync-peers=0".to_string(),
            format!("--verbosity={}", LOG_LEVELS.get(request.log_level)),
            "--slots-per-archive-point=32".to_string(),
            format!("--suggested-fee-recipient={FEE_RECIPIENT}"),
            "--subscribe-all-subnets=true".to_string(),
            format!("--jwt-secret={JWT_MOUNT}"),
            format!("--deposit-contract={:#x}", request.network.deposit_contract_address),
            "--contract-deployment-block=0".to_string(),
            "--disable-monitoring=false".to_string(),
            "--monitoring-host=0.0.0.0".to_string(),
            format!("--monitoring-port={METRICS_PORT}"),
        ];
        if let Some(enr) = request.boot_enr() {
            args.push(format!("--bootstrap-node={enr}"));
        }
        args.extend(request.extra_params.iter().cloned());
        args
    }

    /// Validator client arguments, connected to the beacon node at `beacon_ip`.
    pub fn validator_command(request: &ClLaunchRequest<'_>, beacon_ip: &str) -> Vec<String> {
        vec![
            "--accept-terms-of-use=true".to_string(),
            format!("--chain-config-file={GENESIS_MOUNT}/config.yaml"),
            format!("--beacon-rpc-provider={beacon_ip}:{BEACON_RPC_PORT}"),
            format!("--beacon-rest-api-provider=http://{beacon_ip}:{BEACON_HTTP_PORT}"),
            format!("--wallet-dir={KEYSTORES_MOUNT}/prysm"),
            format!("--wallet-password-file={KEYSTORES_MOUNT}/prysm-password.txt"),
            format!("--datadir={VALIDATOR_DATA_DIR}"),
            format!("--verbosity={}", LOG_LEVELS.get(request.log_level)),
            format!("--suggested-fee-recipient={FEE_RECIPIENT}"),
            "--disable-monitoring=false".to_string(),
            "--monitoring-host=0.0.0.0".to_string(),
            format!("--monitoring-port={METRICS_PORT}"),
        ]
    }
}

#[async_trait]
impl ClClientLauncher for PrysmLauncher {
    fn client_type(&self) -> ClClientType {
        ClClientType::Prysm
    }

    async fn launch(&self, request: ClLaunchRequest<'_>) -> Result<ClClientContext> {
        let kind = ClClientType::Prysm;
        let (beacon_image, validator_image) = split_images(request.image)?;

        let beacon_service = ClService {
            name: beacon_service_name(&request, kind),
            image: beacon_image.to_string(),
            invocation: Invocation::Direct(Self::beacon_command(&request)),
            ports: vec![
                BEACON_RPC_PORT,
                BEACON_HTTP_PORT,
                BEACON_TCP_DISCOVERY_PORT,
                BEACON_UDP_DISCOVERY_PORT,
                METRICS_PORT,
            ],
        };
        let beacon = launch_beacon(
            self.platform.as_ref(),
            &request,
            beacon_service,
            BEACON_HTTP_PORT,
            PRYSM_HEALTH_POLICY,
        )
        .await?;

        let beacon_ip = beacon.handle.private_ip.to_string();
        let validator_service = ClService {
            name: validator_service_name(&request, kind),
            image: validator_image.to_string(),
            invocation: Invocation::Direct(Self::validator_command(&request, &beacon_ip)),
            ports: vec![METRICS_PORT],
        };
        let validator =
            launch_validator(self.platform.as_ref(), &request, validator_service).await?;

        let metrics = vec![
            metrics_endpoint(&beacon.handle, METRICS_PORT),
            metrics_endpoint(&validator, METRICS_PORT),
        ];
        Ok(build_context(kind, beacon, BEACON_HTTP_PORT, Some(&validator), metrics))
    }
}
