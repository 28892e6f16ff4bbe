//! Execution-layer genesis generation.

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use alloy_rpc_types_engine::JwtSecret;
use eyre::{Result, WrapErr, ensure};
use tracing::info;

use super::template::{TemplateData, TemplateError, render};
use crate::{client::ElClientType, prelaunch::PrelaunchEnvironment};

/// Built-in template for the EL genesis generator config.
pub const DEFAULT_EL_GENESIS_CONFIG_TEMPLATE: &str =
    include_str!("../../static_files/el/genesis-config.yaml.tmpl");

const CONFIG_FILE: &str = "el-genesis-config/genesis-config.yaml";
pub(crate) const GENESIS_DIR: &str = "el-genesis";
pub(crate) const GETH_GENESIS_FILE: &str = "el-genesis/geth.json";
const ERIGON_GENESIS_FILE: &str = "el-genesis/erigon.json";
const NETHERMIND_CHAINSPEC_FILE: &str = "el-genesis/chainspec.json";
const BESU_GENESIS_FILE: &str = "el-genesis/besu.json";
pub(crate) const JWT_SECRET_FILE: &str = "jwt/jwtsecret";

/// Generator script and output file for every genesis flavor the tool emits.
const GENERATORS: &[(&str, &str)] = &[
    ("/apps/el-gen/genesis_geth.py", GETH_GENESIS_FILE),
    ("/apps/el-gen/genesis_chainspec.py", NETHERMIND_CHAINSPEC_FILE),
    ("/apps/el-gen/genesis_besu.py", BESU_GENESIS_FILE),
];

/// Inputs to the EL genesis config template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElGenesisParams {
    /// Genesis unix timestamp, shared with the CL genesis.
    pub timestamp: u64,
    /// Chain and network id.
    pub network_id: u64,
    /// Deposit contract address.
    pub deposit_contract_address: Address,
    /// Terminal total difficulty.
    pub total_terminal_difficulty: u64,
    /// Mnemonic for premined accounts.
    pub mnemonic: String,
}

/// EL genesis artifacts on the host, one genesis file per client flavor plus the JWT secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElGenesisData {
    /// Directory holding the genesis files.
    pub dir: PathBuf,
    /// geth-format genesis.
    pub geth_genesis: PathBuf,
    /// erigon genesis (geth format).
    pub erigon_genesis: PathBuf,
    /// nethermind chainspec.
    pub nethermind_chainspec: PathBuf,
    /// besu genesis.
    pub besu_genesis: PathBuf,
    /// Engine API JWT secret file.
    pub jwt_secret_path: PathBuf,
    /// Engine API JWT secret, hex encoded.
    pub jwt_secret_hex: String,
}

impl ElGenesisData {
    /// Genesis file consumed by the given client kind.
    pub fn genesis_for(&self, kind: ElClientType) -> &Path {
        match kind {
            ElClientType::Geth => &self.geth_genesis,
            ElClientType::Erigon => &self.erigon_genesis,
            ElClientType::Nethermind => &self.nethermind_chainspec,
            ElClientType::Besu => &self.besu_genesis,
        }
    }
}

/// Fills the EL genesis config template.
pub fn render_el_genesis_config(
    template: &str,
    params: &ElGenesisParams,
) -> Result<String, TemplateError> {
    let data = TemplateData::new()
        .with("NETWORK_ID", params.network_id)
        .with("DEPOSIT_CONTRACT_ADDRESS", format!("{:#x}", params.deposit_contract_address))
        .with("GENESIS_TIMESTAMP", params.timestamp)
        .with("TOTAL_TERMINAL_DIFFICULTY", params.total_terminal_difficulty)
        .with("MNEMONIC", &params.mnemonic);
    render(template, &data)
}

/// Generates the EL genesis files for every supported flavor and a fresh JWT secret.
///
/// Fails on any template error or non-zero generator exit; nothing is returned unless
/// every artifact was produced.
pub async fn generate_el_genesis_data(
    env: &PrelaunchEnvironment,
    template: &str,
    params: &ElGenesisParams,
) -> Result<ElGenesisData> {
    let config = render_el_genesis_config(template, params)
        .wrap_err("Failed to fill EL genesis config template")?;

    env.create_dir("el-genesis-config")?;
    env.create_dir(GENESIS_DIR)?;
    env.create_dir("jwt")?;

    std::fs::write(env.host_path(CONFIG_FILE), config)
        .wrap_err("Failed to write EL genesis config")?;

    let config_path = env.container_path(CONFIG_FILE);
    for (script, output) in GENERATORS {
        let output_path = env.container_path(output);
        env.run(&format!("python3 {script} {config_path} > {output_path}"))
            .await
            .wrap_err_with(|| format!("Failed to generate {output}"))?;
    }

    let geth_genesis = env.host_path(GETH_GENESIS_FILE);
    let erigon_genesis = env.host_path(ERIGON_GENESIS_FILE);
    std::fs::copy(&geth_genesis, &erigon_genesis).wrap_err("Failed to write erigon genesis")?;

    let jwt_secret_hex = hex::encode(JwtSecret::random().as_bytes());
    let jwt_secret_path = env.host_path(JWT_SECRET_FILE);
    std::fs::write(&jwt_secret_path, &jwt_secret_hex).wrap_err("Failed to write JWT secret")?;

    let data = ElGenesisData {
        dir: env.host_path(GENESIS_DIR),
        geth_genesis,
        erigon_genesis,
        nethermind_chainspec: env.host_path(NETHERMIND_CHAINSPEC_FILE),
        besu_genesis: env.host_path(BESU_GENESIS_FILE),
        jwt_secret_path,
        jwt_secret_hex,
    };

    for kind in [ElClientType::Geth, ElClientType::Nethermind, ElClientType::Besu] {
        let path = data.genesis_for(kind);
        ensure!(path.exists(), "{kind} genesis was not generated at {}", path.display());
    }

    info!(dir = %data.dir.display(), timestamp = params.timestamp, "generated EL genesis data");

    Ok(data)
}
