use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use eyre::Result;

use super::{
    BEACON_DATA_DIR, ClClientContext, ClClientLauncher, ClLaunchRequest, ClService,
    FEE_RECIPIENT, GENESIS_MOUNT, Invocation, JWT_MOUNT, KEYSTORES_MOUNT, beacon_service_name,
    build_context, launch_beacon, metrics_endpoint,
};
use crate::{
    availability::RetryPolicy,
    client::ClClientType,
    config::LogLevelTable,
    platform::ServicePlatform,
    utils::{AND_THEN, PRIVATE_IP},
};

const HTTP_PORT: u16 = 4000;
const DISCOVERY_PORT: u16 = 9000;
const METRICS_PORT: u16 = 8008;

/// Nimbus loads the full genesis state before opening its REST API.
pub const NIMBUS_HEALTH_POLICY: RetryPolicy = RetryPolicy::new(120, Duration::from_secs(1));

const LOG_LEVELS: LogLevelTable = LogLevelTable::UPPERCASE;

const NIMBUS_BINARY: &str = "/home/user/nimbus-eth2/build/nimbus_beacon_node";

/// Nimbus refuses keys readable by others, so they are copied out of the mount first.
const VALIDATORS_DIR: &str = "/nimbus-validators";
const SECRETS_DIR: &str = "/nimbus-secrets";

/// Launches nimbus, which runs beacon node and validators in one process.
#[derive(Debug)]
pub struct NimbusLauncher {
    platform: Arc<dyn ServicePlatform>,
}

impl NimbusLauncher {
    /// Creates a launcher starting services on `platform`.
    pub fn new(platform: Arc<dyn ServicePlatform>) -> Self {
        Self { platform }
    }

    /// Command line: stage keys with strict permissions, then run the node.
    pub fn command(request: &ClLaunchRequest<'_>) -> Vec<String> {
        let keys_source = format!("{KEYSTORES_MOUNT}/nimbus-keys");
        let secrets_source = format!("{KEYSTORES_MOUNT}/secrets");
        let mut args: Vec<String> = [
            "mkdir",
            "-m",
            "700",
            "-p",
            BEACON_DATA_DIR,
            AND_THEN,
            "cp",
            "-R",
            keys_source.as_str(),
            VALIDATORS_DIR,
            AND_THEN,
            "cp",
            "-R",
            secrets_source.as_str(),
            SECRETS_DIR,
            AND_THEN,
            "chmod",
            "-R",
            "700",
            VALIDATORS_DIR,
            SECRETS_DIR,
            AND_THEN,
            "exec",
            NIMBUS_BINARY,
        ]
        .iter()
        .map(|arg| arg.to_string())
        .collect();

        args.extend([
            "--non-interactive=true".to_string(),
            format!("--log-level={}", LOG_LEVELS.get(request.log_level)),
            format!("--network={GENESIS_MOUNT}"),
            format!("--data-dir={BEACON_DATA_DIR}"),
            format!("--web3-url={}", request.el.engine_url()),
            format!("--nat=extip:{PRIVATE_IP}"),
            "--enr-auto-update=false".to_string(),
            format!("--tcp-port={DISCOVERY_PORT}"),
            format!("--udp-port={DISCOVERY_PORT}"),
            "--rest".to_string(),
            "--rest-address=0.0.0.0".to_string(),
            "--rest-allow-origin=*".to_string(),
            format!("--rest-port={HTTP_PORT}"),
            "--num-threads=4".to_string(),
            format!("--jwt-secret={JWT_MOUNT}"),
            "--subscribe-all-subnets=true".to_string(),
            format!("--validators-dir={VALIDATORS_DIR}"),
            format!("--secrets-dir={SECRETS_DIR}"),
            format!("--suggested-fee-recipient={FEE_RECIPIENT}"),
            "--metrics".to_string(),
            "--metrics-address=0.0.0.0".to_string(),
            format!("--metrics-port={METRICS_PORT}"),
        ]);
        if let Some(enr) = request.boot_enr() {
            args.push(format!("--bootstrap-node={enr}"));
        }
        args.extend(request.extra_params.iter().cloned());
        args
    }
}

#[async_trait]
impl ClClientLauncher for NimbusLauncher {
    fn client_type(&self) -> ClClientType {
        ClClientType::Nimbus
    }

    async fn launch(&self, request: ClLaunchRequest<'_>) -> Result<ClClientContext> {
        let kind = ClClientType::Nimbus;
        let service = ClService {
            name: beacon_service_name(&request, kind),
            image: request.image.to_string(),
            invocation: Invocation::Shell(Self::command(&request)),
            ports: vec![HTTP_PORT, DISCOVERY_PORT, METRICS_PORT],
        };
        let beacon = launch_beacon(
            self.platform.as_ref(),
            &request,
            service,
            HTTP_PORT,
            NIMBUS_HEALTH_POLICY,
        )
        .await?;

        let metrics = vec![metrics_endpoint(&beacon.handle, METRICS_PORT)];
        Ok(build_context(kind, beacon, HTTP_PORT, None, metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cl::test_utils::*, el::test_utils as el, participant::BootstrapRole};

    #[test]
    fn test_command() {
        let network = el::network();
        let genesis = el::genesis();
        let el_context = el::el_context("enode://aa@172.18.0.2:30303");
        let keys = keystores(0..64);
        let request = request(&network, &genesis, &el_context, BootstrapRole::Bootstrap, &keys);

        let args = NimbusLauncher::command(&request);
        let exec = args.iter().position(|arg| arg == NIMBUS_BINARY).unwrap();
        assert_eq!(args[exec - 1], "exec");
        assert!(args.contains(&"--log-level=INFO".to_string()));
        assert!(args.contains(&"--web3-url=http://172.18.0.2:8551".to_string()));
        assert!(args.contains(&"--validators-dir=/nimbus-validators".to_string()));
        assert!(!args.iter().any(|arg| arg.starts_with("--bootstrap-node")));
    }
}
