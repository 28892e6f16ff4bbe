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
    availability::RetryPolicy, client::ClClientType, config::LogLevelTable,
    platform::ServicePlatform, utils::PRIVATE_IP,
};

const BEACON_HTTP_PORT: u16 = 4000;
const BEACON_DISCOVERY_PORT: u16 = 9000;
const METRICS_PORT: u16 = 8008;

/// Lodestar runs on node.js and needs a while to load the genesis state.
pub const LODESTAR_HEALTH_POLICY: RetryPolicy = RetryPolicy::new(60, Duration::from_secs(1));

const LOG_LEVELS: LogLevelTable = LogLevelTable::LOWERCASE;

/// Entry script of the lodestar CLI inside its image.
const LODESTAR_CLI: &str = "./packages/cli/bin/lodestar";

/// Launches a lodestar beacon node and a lodestar validator client.
#[derive(Debug)]
pub struct LodestarLauncher {
    platform: Arc<dyn ServicePlatform>,
}

impl LodestarLauncher {
    /// Creates a launcher starting services on `platform`.
    pub fn new(platform: Arc<dyn ServicePlatform>) -> Self {
        Self { platform }
    }

    /// Beacon node command line.
    pub fn beacon_command(request: &ClLaunchRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "node".to_string(),
            LODESTAR_CLI.to_string(),
            "beacon".to_string(),
            format!("--logLevel={}", LOG_LEVELS.get(request.log_level)),
            format!("--port={BEACON_DISCOVERY_PORT}"),
            format!("--discoveryPort={BEACON_DISCOVERY_PORT}"),
            format!("--dataDir={BEACON_DATA_DIR}"),
            format!("--paramsFile={GENESIS_MOUNT}/config.yaml"),
            format!("--genesisStateFile={GENESIS_MOUNT}/genesis.ssz"),
            "--eth1.depositContractDeployBlock=0".to_string(),
            "--network.connectToDiscv5Bootnodes=true".to_string(),
            "--discv5=true".to_string(),
            "--eth1=true".to_string(),
            format!("--eth1.providerUrls={}", request.el.private_rpc_url()),
            format!("--execution.urls={}", request.el.engine_url()),
            "--rest=true".to_string(),
            "--rest.address=0.0.0.0".to_string(),
            "--rest.namespace=*".to_string(),
            format!("--rest.port={BEACON_HTTP_PORT}"),
            format!("--enr.ip={PRIVATE_IP}"),
            format!("--enr.tcp={BEACON_DISCOVERY_PORT}"),
            format!("--enr.udp={BEACON_DISCOVERY_PORT}"),
            "--subscribeAllSubnets=true".to_string(),
            format!("--jwt-secret={JWT_MOUNT}"),
            "--metrics".to_string(),
            "--metrics.address=0.0.0.0".to_string(),
            format!("--metrics.port={METRICS_PORT}"),
        ];
        if let Some(enr) = request.boot_enr() {
            args.push(format!("--bootnodes={enr}"));
        }
        args.extend(request.extra_params.iter().cloned());
        args
    }

    /// Validator client command line, connected to `beacon_url`.
    pub fn validator_command(request: &ClLaunchRequest<'_>, beacon_url: &str) -> Vec<String> {
        vec![
            "node".to_string(),
            LODESTAR_CLI.to_string(),
            "validator".to_string(),
            format!("--logLevel={}", LOG_LEVELS.get(request.log_level)),
            format!("--dataDir={VALIDATOR_DATA_DIR}"),
            format!("--paramsFile={GENESIS_MOUNT}/config.yaml"),
            format!("--server={beacon_url}"),
            format!("--keystoresDir={KEYSTORES_MOUNT}/keys"),
            format!("--secretsDir={KEYSTORES_MOUNT}/lodestar-secrets"),
            format!("--suggestedFeeRecipient={FEE_RECIPIENT}"),
            "--metrics".to_string(),
            "--metrics.address=0.0.0.0".to_string(),
            format!("--metrics.port={METRICS_PORT}"),
        ]
    }
}

#[async_trait]
impl ClClientLauncher for LodestarLauncher {
    fn client_type(&self) -> ClClientType {
        ClClientType::Lodestar
    }

    async fn launch(&self, request: ClLaunchRequest<'_>) -> Result<ClClientContext> {
        let kind = ClClientType::Lodestar;
        let beacon_service = ClService {
            name: beacon_service_name(&request, kind),
            image: request.image.to_string(),
            invocation: Invocation::Shell(Self::beacon_command(&request)),
            ports: vec![BEACON_HTTP_PORT, BEACON_DISCOVERY_PORT, METRICS_PORT],
        };
        let beacon = launch_beacon(
            self.platform.as_ref(),
            &request,
            beacon_service,
            BEACON_HTTP_PORT,
            LODESTAR_HEALTH_POLICY,
        )
        .await?;

        let beacon_url = beacon.handle.private_url("http", BEACON_HTTP_PORT);
        let validator_service = ClService {
            name: validator_service_name(&request, kind),
            image: request.image.to_string(),
            invocation: Invocation::Shell(Self::validator_command(&request, &beacon_url)),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cl::test_utils::*, el::test_utils as el, participant::BootstrapRole};

    #[test]
    fn test_commands() {
        let network = el::network();
        let genesis = el::genesis();
        let el_context = el::el_context("enode://aa@172.18.0.2:30303");
        let anchor = cl_context("enr:-anchor");
        let keys = keystores(0..32);
        let request =
            request(&network, &genesis, &el_context, BootstrapRole::Peer(&anchor), &keys);

        let beacon = LodestarLauncher::beacon_command(&request);
        assert_eq!(&beacon[..3], &["node", LODESTAR_CLI, "beacon"]);
        assert!(beacon.contains(&"--eth1.providerUrls=http://172.18.0.2:8545".to_string()));
        assert!(beacon.contains(&"--execution.urls=http://172.18.0.2:8551".to_string()));
        assert!(beacon.contains(&"--bootnodes=enr:-anchor".to_string()));

        let validator = LodestarLauncher::validator_command(&request, "http://172.18.0.4:4000");
        assert!(validator.contains(&"--server=http://172.18.0.4:4000".to_string()));
        assert!(validator.contains(&"--secretsDir=/validator-keys/lodestar-secrets".to_string()));
    }
}
