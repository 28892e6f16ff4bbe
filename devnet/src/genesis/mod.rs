//! Genesis data generation for both layers.
//!
//! The EL genesis is produced first because the CL genesis state embeds the EL genesis
//! block. Both sides share a single genesis timestamp, computed once by the caller.

mod cl;
pub use cl::{
    ClGenesisData, ClGenesisParams, DEFAULT_CL_CONFIG_TEMPLATE, DEFAULT_CL_MNEMONICS_TEMPLATE,
    generate_cl_genesis_data, render_cl_config, render_cl_mnemonics,
};

mod el;
pub use el::{
    DEFAULT_EL_GENESIS_CONFIG_TEMPLATE, ElGenesisData, ElGenesisParams, generate_el_genesis_data,
    render_el_genesis_config,
};

mod template;
pub use template::{TemplateData, TemplateError, render};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::{config::NetworkConfig, prelaunch::PrelaunchEnvironment};

/// The generator config templates used for a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisTemplates {
    /// EL genesis generator config.
    pub el_genesis_config: String,
    /// CL chain config.
    pub cl_config: String,
    /// CL genesis tool mnemonics list.
    pub cl_mnemonics: String,
}

impl Default for GenesisTemplates {
    fn default() -> Self {
        Self {
            el_genesis_config: DEFAULT_EL_GENESIS_CONFIG_TEMPLATE.to_string(),
            cl_config: DEFAULT_CL_CONFIG_TEMPLATE.to_string(),
            cl_mnemonics: DEFAULT_CL_MNEMONICS_TEMPLATE.to_string(),
        }
    }
}

/// Everything the launchers need from genesis generation. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisArtifact {
    /// Genesis unix timestamp shared by both layers.
    pub timestamp: u64,
    /// EL genesis files and JWT secret.
    pub el: ElGenesisData,
    /// CL testnet directory.
    pub cl: ClGenesisData,
}

/// Host paths of the generated genesis files, as reported in the network summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisPaths {
    /// Genesis unix timestamp.
    pub timestamp: u64,
    /// EL genesis directory.
    pub el_genesis_dir: String,
    /// CL testnet directory.
    pub cl_genesis_dir: String,
    /// JWT secret file.
    pub jwt_secret: String,
}

impl From<&GenesisArtifact> for GenesisPaths {
    fn from(artifact: &GenesisArtifact) -> Self {
        Self {
            timestamp: artifact.timestamp,
            el_genesis_dir: artifact.el.dir.display().to_string(),
            cl_genesis_dir: artifact.cl.dir.display().to_string(),
            jwt_secret: artifact.el.jwt_secret_path.display().to_string(),
        }
    }
}

/// Genesis timestamp `delay` from now.
pub fn genesis_timestamp(delay: Duration) -> Result<u64> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).wrap_err("System clock before 1970")?;
    Ok((now + delay).as_secs())
}

/// Generates EL then CL genesis data with one shared timestamp.
pub async fn generate_genesis(
    env: &PrelaunchEnvironment,
    templates: &GenesisTemplates,
    config: &NetworkConfig,
    timestamp: u64,
) -> Result<GenesisArtifact> {
    let el_params = ElGenesisParams {
        timestamp,
        network_id: config.network_id,
        deposit_contract_address: config.deposit_contract_address,
        total_terminal_difficulty: config.total_terminal_difficulty,
        mnemonic: config.validator_mnemonic.clone(),
    };
    let el = generate_el_genesis_data(env, &templates.el_genesis_config, &el_params)
        .await
        .wrap_err("Failed to generate EL genesis data")?;

    let cl_params = ClGenesisParams::from_config(config, timestamp)?;
    let cl = generate_cl_genesis_data(
        env,
        &templates.cl_config,
        &templates.cl_mnemonics,
        &el,
        &cl_params,
    )
    .await
    .wrap_err("Failed to generate CL genesis data")?;

    Ok(GenesisArtifact { timestamp, el, cl })
}
