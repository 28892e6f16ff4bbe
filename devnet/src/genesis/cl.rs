//! Consensus-layer genesis generation. Runs strictly after the EL genesis exists.

use std::path::PathBuf;

use alloy_primitives::Address;
use eyre::{Result, WrapErr, ensure};
use tracing::info;

use super::{
    el::{ElGenesisData, GETH_GENESIS_FILE},
    template::{TemplateData, TemplateError, render},
};
use crate::{
    config::{ConsensusPreset, NetworkConfig},
    error::ConfigError,
    prelaunch::PrelaunchEnvironment,
};

/// Built-in template for the CL `config.yaml`.
pub const DEFAULT_CL_CONFIG_TEMPLATE: &str = include_str!("../../static_files/cl/config.yaml.tmpl");
/// Built-in template for the CL genesis tool's `mnemonics.yaml`.
pub const DEFAULT_CL_MNEMONICS_TEMPLATE: &str =
    include_str!("../../static_files/cl/mnemonics.yaml.tmpl");

pub(crate) const GENESIS_DIR: &str = "cl-genesis";
const CONFIG_FILE: &str = "cl-genesis/config.yaml";
const GENESIS_STATE_FILE: &str = "cl-genesis/genesis.ssz";
const TRANCHES_DIR: &str = "cl-genesis/tranches";
const JWT_SECRET_FILE: &str = "cl-genesis/jwtsecret";
const MNEMONICS_FILE: &str = "cl-genesis-config/mnemonics.yaml";

/// Inputs to the CL templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClGenesisParams {
    /// Genesis unix timestamp, identical to the one used for the EL genesis.
    pub timestamp: u64,
    /// Chain and network id.
    pub network_id: u64,
    /// Deposit contract address.
    pub deposit_contract_address: Address,
    /// Slot duration.
    pub seconds_per_slot: u64,
    /// Consensus preset.
    pub preset: ConsensusPreset,
    /// Altair fork epoch.
    pub altair_fork_epoch: u64,
    /// Merge fork epoch.
    pub merge_fork_epoch: u64,
    /// Terminal total difficulty.
    pub total_terminal_difficulty: u64,
    /// Validator key mnemonic.
    pub mnemonic: String,
    /// Number of genesis validators.
    pub num_validator_keys: u32,
}

impl ClGenesisParams {
    /// Derives template inputs from the network config and the shared genesis timestamp.
    pub fn from_config(config: &NetworkConfig, timestamp: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            timestamp,
            network_id: config.network_id,
            deposit_contract_address: config.deposit_contract_address,
            seconds_per_slot: config.seconds_per_slot,
            preset: config.preset,
            altair_fork_epoch: config.altair_fork_epoch,
            merge_fork_epoch: config.merge_fork_epoch,
            total_terminal_difficulty: config.total_terminal_difficulty,
            mnemonic: config.validator_mnemonic.clone(),
            num_validator_keys: config.total_validator_keys()?,
        })
    }

    fn template_data(&self) -> TemplateData {
        TemplateData::new()
            .with("PRESET_BASE", self.preset.as_str())
            .with("NETWORK_ID", self.network_id)
            .with("DEPOSIT_CONTRACT_ADDRESS", format!("{:#x}", self.deposit_contract_address))
            .with("GENESIS_TIMESTAMP", self.timestamp)
            .with("SECONDS_PER_SLOT", self.seconds_per_slot)
            .with("ALTAIR_FORK_EPOCH", self.altair_fork_epoch)
            .with("MERGE_FORK_EPOCH", self.merge_fork_epoch)
            .with("TOTAL_TERMINAL_DIFFICULTY", self.total_terminal_difficulty)
            .with("MNEMONIC", &self.mnemonic)
            .with("NUM_VALIDATOR_KEYS", self.num_validator_keys)
    }
}

/// CL genesis artifacts on the host. `dir` doubles as the clients' testnet directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClGenesisData {
    /// Testnet directory with every file below.
    pub dir: PathBuf,
    /// Chain config.
    pub config_yaml: PathBuf,
    /// SSZ-encoded genesis state.
    pub genesis_ssz: PathBuf,
    /// Copy of the EL JWT secret.
    pub jwt_secret_path: PathBuf,
}

/// Fills the CL `config.yaml` template.
pub fn render_cl_config(template: &str, params: &ClGenesisParams) -> Result<String, TemplateError> {
    render(template, &params.template_data())
}

/// Fills the CL `mnemonics.yaml` template.
pub fn render_cl_mnemonics(
    template: &str,
    params: &ClGenesisParams,
) -> Result<String, TemplateError> {
    render(template, &params.template_data())
}

/// Generates the CL config and genesis state on top of existing EL genesis data.
pub async fn generate_cl_genesis_data(
    env: &PrelaunchEnvironment,
    config_template: &str,
    mnemonics_template: &str,
    el_genesis: &ElGenesisData,
    params: &ClGenesisParams,
) -> Result<ClGenesisData> {
    let config = render_cl_config(config_template, params)
        .wrap_err("Failed to fill CL config template")?;
    let mnemonics = render_cl_mnemonics(mnemonics_template, params)
        .wrap_err("Failed to fill CL mnemonics template")?;

    ensure!(
        el_genesis.geth_genesis.exists(),
        "EL genesis must be generated before the CL genesis"
    );

    env.create_dir("cl-genesis-config")?;
    let dir = env.create_dir(GENESIS_DIR)?;

    let config_yaml = env.host_path(CONFIG_FILE);
    std::fs::write(&config_yaml, config).wrap_err("Failed to write CL config")?;
    std::fs::write(env.host_path(MNEMONICS_FILE), mnemonics)
        .wrap_err("Failed to write CL mnemonics")?;

    let deposit_contract = format!("{:#x}", params.deposit_contract_address);
    for (file, content) in [
        ("deploy_block.txt", "0"),
        ("deposit_contract_block.txt", "0"),
        ("deposit_contract.txt", deposit_contract.as_str()),
    ] {
        std::fs::write(dir.join(file), content)
            .wrap_err_with(|| format!("Failed to write {file}"))?;
    }

    let jwt_secret_path = env.host_path(JWT_SECRET_FILE);
    std::fs::copy(&el_genesis.jwt_secret_path, &jwt_secret_path)
        .wrap_err("Failed to copy JWT secret into CL genesis")?;

    let script = format!(
        "eth2-testnet-genesis merge --config {config} --mnemonics {mnemonics} \
         --eth1-config {eth1} --tranches-dir {tranches} --state-output {state}",
        config = env.container_path(CONFIG_FILE),
        mnemonics = env.container_path(MNEMONICS_FILE),
        eth1 = env.container_path(GETH_GENESIS_FILE),
        tranches = env.container_path(TRANCHES_DIR),
        state = env.container_path(GENESIS_STATE_FILE),
    );
    env.run(&script).await.wrap_err("Failed to generate CL genesis state")?;

    let genesis_ssz = env.host_path(GENESIS_STATE_FILE);
    ensure!(genesis_ssz.exists(), "genesis.ssz was not generated");

    info!(dir = %dir.display(), timestamp = params.timestamp, "generated CL genesis data");

    Ok(ClGenesisData { dir, config_yaml, genesis_ssz, jwt_secret_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TestnetParams;

    #[test]
    fn test_default_config_renders() {
        let config = TestnetParams::default().validate().unwrap();
        let params = ClGenesisParams::from_config(&config, 1_700_000_000).unwrap();
        let out = render_cl_config(DEFAULT_CL_CONFIG_TEMPLATE, &params).unwrap();

        assert!(out.contains("PRESET_BASE: 'mainnet'"));
        assert!(out.contains("MIN_GENESIS_TIME: 1700000000"));
        assert!(out.contains("MIN_GENESIS_ACTIVE_VALIDATOR_COUNT: 64"));
        assert!(out.contains("BELLATRIX_FORK_EPOCH: 2"));
        assert!(out.contains("DEPOSIT_CHAIN_ID: 3151908"));
        assert!(!out.contains("${"));
    }

    #[test]
    fn test_mnemonics_render() {
        let config = TestnetParams::default().validate().unwrap();
        let params = ClGenesisParams::from_config(&config, 0).unwrap();
        let out = render_cl_mnemonics(DEFAULT_CL_MNEMONICS_TEMPLATE, &params).unwrap();
        assert!(out.starts_with("- mnemonic: \"giant issue"));
        assert!(out.contains("count: 64"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let config = TestnetParams::default().validate().unwrap();
        let params = ClGenesisParams::from_config(&config, 1_700_000_000).unwrap();
        let again = ClGenesisParams::from_config(&config, 1_700_000_000).unwrap();

        assert_eq!(
            render_cl_config(DEFAULT_CL_CONFIG_TEMPLATE, &params).unwrap(),
            render_cl_config(DEFAULT_CL_CONFIG_TEMPLATE, &again).unwrap()
        );
        assert_eq!(
            render_cl_mnemonics(DEFAULT_CL_MNEMONICS_TEMPLATE, &params).unwrap(),
            render_cl_mnemonics(DEFAULT_CL_MNEMONICS_TEMPLATE, &again).unwrap()
        );
    }

    #[test]
    fn test_key_count_overflow_is_config_error() {
        let mut config = TestnetParams::default().validate().unwrap();
        config.num_participants = 2;
        config.keys_per_node = u32::MAX;
        assert!(matches!(
            ClGenesisParams::from_config(&config, 0),
            Err(ConfigError::InvalidParameter { name: "num_validator_keys_per_node", .. })
        ));
    }
}
