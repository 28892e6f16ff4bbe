//! In-memory platform and launcher fakes shared by the integration tests.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr},
    ops::Range,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use eyre::{Result, bail, eyre};
use merge_devnet::{
    cl::{ClClientContext, ClClientLauncher, ClLaunchRequest},
    client::{ClClientType, ElClientType},
    config::{NetworkConfig, TestnetParams},
    el::{ElClientContext, ElClientLauncher, ElLaunchRequest, MiningWaiter},
    genesis::{ClGenesisData, ElGenesisData, GenesisArtifact},
    keystores::KeystoreAssignment,
    participant::{ClLaunchers, ElLaunchers},
    platform::{ExecOutput, ServiceHandle, ServicePlatform, ServiceRequest},
    prelaunch::CONTAINER_DATA_DIR,
};
use url::Url;

/// Keystore directory names produced by the keystore tool.
const KEYSTORE_LAYOUT: &[&str] = &[
    "keys",
    "secrets",
    "lodestar-secrets",
    "nimbus-keys",
    "prysm",
    "teku-keys",
    "teku-secrets",
];

/// A platform that emulates the generator tools by writing their outputs to the host.
#[derive(Debug, Default)]
pub struct FakePlatform {
    host_dir: Mutex<Option<PathBuf>>,
    launched: Mutex<Vec<ServiceRequest>>,
    scripts: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
}

impl FakePlatform {
    /// Any exec whose script contains `needle` exits with code 1.
    pub fn failing_on(needle: &'static str) -> Self {
        Self { fail_on: Some(needle), ..Default::default() }
    }

    pub fn launched(&self) -> Vec<ServiceRequest> {
        self.launched.lock().unwrap().clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }

    fn host_path(&self, container_path: &str) -> Result<PathBuf> {
        let host_dir =
            self.host_dir.lock().unwrap().clone().ok_or_else(|| eyre!("no data mount"))?;
        let relative = container_path
            .strip_prefix(CONTAINER_DATA_DIR)
            .ok_or_else(|| eyre!("{container_path} is outside the data mount"))?;
        Ok(host_dir.join(relative.trim_start_matches('/')))
    }

    fn emulate(&self, script: &str) -> Result<()> {
        let words: Vec<&str> = script.split_whitespace().collect();
        match words.first().copied() {
            Some("python3") => {
                let output = words.last().ok_or_else(|| eyre!("missing output"))?;
                write_file(&self.host_path(output)?, "{}")
            }
            Some("eth2-testnet-genesis") => {
                let output = flag_value(&words, "--state-output")?;
                write_file(&self.host_path(output)?, "ssz")
            }
            Some("eth2-val-tools") => {
                let root = self.host_path(flag_value(&words, "--out-loc")?)?;
                for dir in KEYSTORE_LAYOUT {
                    std::fs::create_dir_all(root.join(dir))?;
                }
                Ok(())
            }
            _ => bail!("unexpected command `{script}`"),
        }
    }
}

fn flag_value<'a>(words: &[&'a str], flag: &str) -> Result<&'a str> {
    words
        .iter()
        .position(|word| *word == flag)
        .and_then(|index| words.get(index + 1).copied())
        .ok_or_else(|| eyre!("missing {flag}"))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

#[async_trait]
impl ServicePlatform for FakePlatform {
    async fn launch(&self, request: ServiceRequest) -> Result<ServiceHandle> {
        if let Some(mount) = request.mounts.iter().find(|m| m.container_path == CONTAINER_DATA_DIR)
        {
            *self.host_dir.lock().unwrap() = Some(mount.host_path.clone());
        }
        let mut launched = self.launched.lock().unwrap();
        let octet = 2 + launched.len() as u8;
        let host_ports = request
            .ports
            .iter()
            .map(|port| (*port, format!("127.0.0.1:{}", 40_000 + u32::from(*port))))
            .collect();
        let handle = ServiceHandle {
            name: request.name.clone(),
            private_ip: IpAddr::V4(Ipv4Addr::new(172, 18, 0, octet)),
            host_ports,
        };
        launched.push(request);
        Ok(handle)
    }

    async fn exec(&self, _service: &ServiceHandle, cmd: Vec<String>) -> Result<ExecOutput> {
        let script = cmd.last().cloned().unwrap_or_default();
        self.scripts.lock().unwrap().push(script.clone());

        if self.fail_on.is_some_and(|needle| script.contains(needle)) {
            return Ok(ExecOutput { exit_code: 1, output: "tool crashed".to_string() });
        }
        self.emulate(&script)?;
        Ok(ExecOutput { exit_code: 0, output: String::new() })
    }
}

/// What a fake launcher was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRecord {
    pub ordinal: usize,
    pub bootstrap: Option<String>,
    pub image: String,
}

/// Execution launcher returning a synthetic context.
#[derive(Debug)]
pub struct FakeElLauncher {
    kind: ElClientType,
    records: Mutex<Vec<LaunchRecord>>,
}

impl FakeElLauncher {
    pub fn new(kind: ElClientType) -> Arc<Self> {
        Arc::new(Self { kind, records: Mutex::default() })
    }

    pub fn records(&self) -> Vec<LaunchRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ElClientLauncher for FakeElLauncher {
    fn client_type(&self) -> ElClientType {
        self.kind
    }

    async fn launch(&self, request: ElLaunchRequest<'_>) -> Result<ElClientContext> {
        self.records.lock().unwrap().push(LaunchRecord {
            ordinal: request.ordinal,
            bootstrap: request.bootnode().map(str::to_string),
            image: request.image.to_string(),
        });
        let octet = 10 + request.ordinal as u8;
        Ok(ElClientContext {
            client_type: self.kind,
            service_name: format!("el-{}-{}", request.ordinal, self.kind),
            enr: None,
            enode: format!("enode://{}@172.18.1.{octet}:30303", request.ordinal),
            private_ip: IpAddr::V4(Ipv4Addr::new(172, 18, 1, octet)),
            rpc_port: 8545,
            ws_port: 8546,
            engine_port: 8551,
            rpc_url: Url::parse("http://127.0.0.1:8545")?,
            mining_waiter: MiningWaiter::Disabled,
        })
    }
}

/// Consensus launcher returning a synthetic context, or failing when told to.
#[derive(Debug)]
pub struct FakeClLauncher {
    kind: ClClientType,
    fail: bool,
    records: Mutex<Vec<LaunchRecord>>,
    engines: Mutex<Vec<String>>,
    key_ranges: Mutex<Vec<Range<u32>>>,
}

impl FakeClLauncher {
    pub fn new(kind: ClClientType) -> Arc<Self> {
        Arc::new(Self {
            kind,
            fail: false,
            records: Mutex::default(),
            engines: Mutex::default(),
            key_ranges: Mutex::default(),
        })
    }

    pub fn failing(kind: ClClientType) -> Arc<Self> {
        Arc::new(Self {
            kind,
            fail: true,
            records: Mutex::default(),
            engines: Mutex::default(),
            key_ranges: Mutex::default(),
        })
    }

    pub fn records(&self) -> Vec<LaunchRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Engine URL each launch was wired to.
    pub fn engines(&self) -> Vec<String> {
        self.engines.lock().unwrap().clone()
    }

    pub fn key_ranges(&self) -> Vec<Range<u32>> {
        self.key_ranges.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClClientLauncher for FakeClLauncher {
    fn client_type(&self) -> ClClientType {
        self.kind
    }

    async fn launch(&self, request: ClLaunchRequest<'_>) -> Result<ClClientContext> {
        self.records.lock().unwrap().push(LaunchRecord {
            ordinal: request.ordinal,
            bootstrap: request.boot_enr().map(str::to_string),
            image: request.image.to_string(),
        });
        self.engines.lock().unwrap().push(request.el.engine_url());
        self.key_ranges.lock().unwrap().push(request.keystores.range.clone());

        if self.fail {
            bail!("beacon node exited during startup");
        }

        let octet = 20 + request.ordinal as u8;
        Ok(ClClientContext {
            client_type: self.kind,
            client_name: self.kind.to_string(),
            service_name: format!("cl-{}-{}", request.ordinal, self.kind),
            enr: format!("enr:-node{}", request.ordinal),
            peer_id: format!("16Uiu2HAm{}", request.ordinal),
            private_ip: IpAddr::V4(Ipv4Addr::new(172, 18, 1, octet)),
            http_port: 4000,
            beacon_url: Url::parse("http://127.0.0.1:4000")?,
            validator_service_name: None,
            metrics: vec![],
        })
    }
}

pub fn el_launchers(launchers: &[Arc<FakeElLauncher>]) -> ElLaunchers {
    launchers
        .iter()
        .map(|launcher| (launcher.client_type(), launcher.clone() as Arc<dyn ElClientLauncher>))
        .collect::<HashMap<_, _>>()
}

pub fn cl_launchers(launchers: &[Arc<FakeClLauncher>]) -> ClLaunchers {
    launchers
        .iter()
        .map(|launcher| (launcher.client_type(), launcher.clone() as Arc<dyn ClClientLauncher>))
        .collect::<HashMap<_, _>>()
}

pub fn network_config() -> NetworkConfig {
    TestnetParams::default().validate().unwrap()
}

pub fn genesis_artifact() -> GenesisArtifact {
    let root = PathBuf::from("/tmp/devnet");
    GenesisArtifact {
        timestamp: 1_700_000_000,
        el: ElGenesisData {
            dir: root.join("el-genesis"),
            geth_genesis: root.join("el-genesis/geth.json"),
            erigon_genesis: root.join("el-genesis/erigon.json"),
            nethermind_chainspec: root.join("el-genesis/chainspec.json"),
            besu_genesis: root.join("el-genesis/besu.json"),
            jwt_secret_path: root.join("jwt/jwtsecret"),
            jwt_secret_hex: "ab".repeat(32),
        },
        cl: ClGenesisData {
            dir: root.join("cl-genesis"),
            config_yaml: root.join("cl-genesis/config.yaml"),
            genesis_ssz: root.join("cl-genesis/genesis.ssz"),
            jwt_secret_path: root.join("cl-genesis/jwtsecret"),
        },
    }
}

/// Keystore assignments for `ranges`, one per ordinal.
pub fn keystores(ranges: &[Range<u32>]) -> Vec<KeystoreAssignment> {
    ranges
        .iter()
        .enumerate()
        .map(|(index, range)| {
            KeystoreAssignment::new(
                index,
                range.clone(),
                PathBuf::from(format!("/tmp/devnet/keystores/node-{index}")),
            )
        })
        .collect()
}
