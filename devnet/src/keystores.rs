//! Validator key partitioning and per-node keystore generation.
//!
//! All keys derive from one mnemonic. They are split into contiguous index ranges, one
//! per node, and each range is materialized in every keystore layout the supported
//! consensus clients read.

use std::{ops::Range, path::PathBuf};

use eyre::{Result, WrapErr, ensure};
use tracing::{debug, info};

use crate::{error::ConfigError, prelaunch::PrelaunchEnvironment, utils::shell_quote};

const KEYSTORES_DIR: &str = "keystores";

/// Password protecting the generated prysm wallets.
pub const PRYSM_PASSWORD: &str = "password";

const PRYSM_PASSWORD_FILE: &str = "prysm-password.txt";

/// Splits `total_keys` into `num_nodes` contiguous ranges covering `[0, total_keys)`.
///
/// Every node gets `total_keys / num_nodes` keys and node 0 also takes the remainder.
/// Fails without side effects when there are no nodes or more nodes than keys.
pub fn partition_validator_keys(
    total_keys: u32,
    num_nodes: usize,
) -> Result<Vec<Range<u32>>, ConfigError> {
    if num_nodes == 0 {
        return Err(ConfigError::NoNodes);
    }
    let nodes = u32::try_from(num_nodes)
        .ok()
        .filter(|nodes| *nodes <= total_keys)
        .ok_or(ConfigError::TooManyNodes { nodes: num_nodes, keys: total_keys })?;

    let base = total_keys / nodes;
    let remainder = total_keys % nodes;

    let mut ranges = Vec::with_capacity(num_nodes);
    let mut start = 0;
    for index in 0..nodes {
        let count = if index == 0 { base + remainder } else { base };
        ranges.push(start..start + count);
        start += count;
    }

    Ok(ranges)
}

/// One node's share of the validator keys, laid out for every consensus client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreAssignment {
    /// Participant ordinal the keys belong to.
    pub node_index: usize,
    /// Key indices held by this node.
    pub range: Range<u32>,
    /// Root of this node's keystore tree.
    pub root: PathBuf,
    /// EIP-2335 keystores, one directory per public key (lighthouse, nimbus validator).
    pub raw_keys_dir: PathBuf,
    /// Keystore passwords, one file per public key.
    pub raw_secrets_dir: PathBuf,
    /// Passwords in the lodestar layout.
    pub lodestar_secrets_dir: PathBuf,
    /// Keystores in the nimbus layout.
    pub nimbus_keys_dir: PathBuf,
    /// prysm wallet directory.
    pub prysm_dir: PathBuf,
    /// File holding [`PRYSM_PASSWORD`].
    pub prysm_password_file: PathBuf,
    /// Keystores in the teku layout.
    pub teku_keys_dir: PathBuf,
    /// Passwords in the teku layout.
    pub teku_secrets_dir: PathBuf,
}

impl KeystoreAssignment {
    /// Lays out the per-format directories under `root`.
    pub fn new(node_index: usize, range: Range<u32>, root: PathBuf) -> Self {
        Self {
            node_index,
            range,
            raw_keys_dir: root.join("keys"),
            raw_secrets_dir: root.join("secrets"),
            lodestar_secrets_dir: root.join("lodestar-secrets"),
            nimbus_keys_dir: root.join("nimbus-keys"),
            prysm_dir: root.join("prysm"),
            prysm_password_file: root.join(PRYSM_PASSWORD_FILE),
            teku_keys_dir: root.join("teku-keys"),
            teku_secrets_dir: root.join("teku-secrets"),
            root,
        }
    }

    /// Number of validator keys assigned.
    pub fn num_keys(&self) -> u32 {
        self.range.end - self.range.start
    }

    /// Every per-format directory the keystore tool must have produced.
    pub fn format_dirs(&self) -> [&PathBuf; 7] {
        [
            &self.raw_keys_dir,
            &self.raw_secrets_dir,
            &self.lodestar_secrets_dir,
            &self.nimbus_keys_dir,
            &self.prysm_dir,
            &self.teku_keys_dir,
            &self.teku_secrets_dir,
        ]
    }
}

/// Generates keystores for `num_nodes` nodes from `mnemonic`.
///
/// The split is validated before any command runs. Keystores for node `i` land in
/// `keystores/node-<i>` of the shared directory.
pub async fn generate_keystores(
    env: &PrelaunchEnvironment,
    mnemonic: &str,
    total_keys: u32,
    num_nodes: usize,
) -> Result<Vec<KeystoreAssignment>> {
    let ranges = partition_validator_keys(total_keys, num_nodes)?;

    env.create_dir(KEYSTORES_DIR)?;

    let mut assignments = Vec::with_capacity(ranges.len());
    for (node_index, range) in ranges.into_iter().enumerate() {
        let relative = format!("{KEYSTORES_DIR}/node-{node_index}");
        let script = keystore_command(&env.container_path(&relative), mnemonic, &range);

        debug!(node_index, start = range.start, stop = range.end, "generating keystores");
        env.run(&script)
            .await
            .wrap_err_with(|| format!("Failed to generate keystores for node {node_index}"))?;

        let assignment = KeystoreAssignment::new(node_index, range, env.host_path(&relative));
        for dir in assignment.format_dirs() {
            ensure!(dir.is_dir(), "keystore directory {} was not generated", dir.display());
        }
        std::fs::write(&assignment.prysm_password_file, PRYSM_PASSWORD)
            .wrap_err("Failed to write prysm password file")?;

        assignments.push(assignment);
    }

    info!(total_keys, num_nodes, "generated validator keystores");

    Ok(assignments)
}

fn keystore_command(out_loc: &str, mnemonic: &str, range: &Range<u32>) -> String {
    format!(
        "eth2-val-tools keystores --insecure --prysm-pass {PRYSM_PASSWORD} --out-loc {out_loc} \
         --source-mnemonic {mnemonic} --source-min {} --source-max {}",
        range.start,
        range.end,
        mnemonic = shell_quote(mnemonic),
    )
}
