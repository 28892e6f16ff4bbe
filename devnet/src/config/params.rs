//! User-facing testnet parameters and their validation.

use std::path::Path;

use alloy_primitives::Address;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ConsensusPreset, LogLevel, NetworkConfig};
use crate::{
    client::{ClClientType, ElClientType},
    error::ConfigError,
    images::PRELAUNCH_IMAGE,
};

/// Mnemonic validator keys are derived from when none is configured.
pub const DEFAULT_VALIDATOR_MNEMONIC: &str = "giant issue aisle success illegal bike spike question tent bar rely arctic volcano long crawl hungry vocal artwork sniff fantasy very lucky have athlete";

/// One requested EL/CL node pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParticipantSpec {
    /// Execution client kind.
    pub el_client_type: ElClientType,
    /// Execution client image override.
    pub el_client_image: Option<String>,
    /// Execution client log level override.
    pub el_client_log_level: Option<LogLevel>,
    /// Extra flags appended to the execution client command.
    pub el_extra_params: Vec<String>,
    /// Consensus client kind.
    pub cl_client_type: ClClientType,
    /// Consensus client image override.
    pub cl_client_image: Option<String>,
    /// Consensus client log level override.
    pub cl_client_log_level: Option<LogLevel>,
    /// Extra flags appended to the beacon node command.
    pub cl_extra_params: Vec<String>,
}

impl ParticipantSpec {
    /// Creates a spec with default images and log levels.
    pub fn new(el_client_type: ElClientType, cl_client_type: ClClientType) -> Self {
        Self { el_client_type, cl_client_type, ..Default::default() }
    }

    /// Execution client image, falling back to the kind's default.
    pub fn el_image(&self) -> String {
        self.el_client_image
            .clone()
            .unwrap_or_else(|| self.el_client_type.default_image().to_string())
    }

    /// Consensus client image, falling back to the kind's default.
    pub fn cl_image(&self) -> String {
        self.cl_client_image.clone().unwrap_or_else(|| self.cl_client_type.default_image())
    }

    /// Execution client log level, falling back to `global`.
    pub fn el_log_level(&self, global: LogLevel) -> LogLevel {
        self.el_client_log_level.unwrap_or(global)
    }

    /// Consensus client log level, falling back to `global`.
    pub fn cl_log_level(&self, global: LogLevel) -> LogLevel {
        self.cl_client_log_level.unwrap_or(global)
    }
}

/// Chain-level parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkParams {
    /// Execution chain and network id.
    pub network_id: u64,
    /// Deposit contract address, `0x`-prefixed hex.
    pub deposit_contract_address: String,
    /// Slot duration in seconds.
    pub seconds_per_slot: u64,
    /// Slots per epoch, 32 (mainnet preset) or 8 (minimal preset).
    pub slots_per_epoch: u64,
    /// Altair fork epoch.
    pub altair_fork_epoch: u64,
    /// Merge fork epoch.
    pub merge_fork_epoch: u64,
    /// Terminal total difficulty.
    pub total_terminal_difficulty: u64,
    /// Mnemonic for validator key derivation.
    pub preregistered_validator_keys_mnemonic: String,
    /// Validator keys generated for each participant.
    pub num_validator_keys_per_node: u32,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            network_id: 3_151_908,
            deposit_contract_address: "0x4242424242424242424242424242424242424242".to_string(),
            seconds_per_slot: 12,
            slots_per_epoch: 32,
            altair_fork_epoch: 1,
            merge_fork_epoch: 2,
            total_terminal_difficulty: 100_000_000,
            preregistered_validator_keys_mnemonic: DEFAULT_VALIDATOR_MNEMONIC.to_string(),
            num_validator_keys_per_node: 64,
        }
    }
}

/// Launch-time behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchParams {
    /// Log level for clients without a participant override.
    pub global_client_log_level: LogLevel,
    /// Block until the bootstrap EL has produced a block.
    pub wait_for_mining: bool,
    /// Seconds between now and the genesis timestamp.
    pub genesis_delay_secs: u64,
    /// Image hosting the genesis and keystore tools.
    pub prelaunch_image: String,
    /// Use service names verbatim as container names.
    pub stable_names: bool,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            global_client_log_level: LogLevel::Info,
            wait_for_mining: true,
            genesis_delay_secs: 120,
            prelaunch_image: PRELAUNCH_IMAGE.to_string(),
            stable_names: false,
        }
    }
}

/// Complete input for a devnet build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestnetParams {
    /// Requested node pairs, in launch order. The first one becomes the bootstrap.
    pub participants: Vec<ParticipantSpec>,
    /// Chain-level parameters.
    pub network: NetworkParams,
    /// Launch-time behaviour.
    pub launch: LaunchParams,
}

impl Default for TestnetParams {
    fn default() -> Self {
        Self {
            participants: vec![ParticipantSpec::default()],
            network: NetworkParams::default(),
            launch: LaunchParams::default(),
        }
    }
}

impl TestnetParams {
    /// Reads parameters from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&content).wrap_err_with(|| format!("Failed to parse {}", path.display()))
    }

    /// Parses parameters from JSON. Unknown client kinds surface as [`ConfigError`].
    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content).wrap_err("Invalid JSON")?;
        check_client_kinds(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Checks the parameters and derives the immutable [`NetworkConfig`].
    pub fn validate(&self) -> Result<NetworkConfig, ConfigError> {
        let network = &self.network;

        if self.participants.is_empty() {
            return Err(ConfigError::MissingParameter("participants"));
        }
        if network.preregistered_validator_keys_mnemonic.trim().is_empty() {
            return Err(ConfigError::MissingParameter("preregistered_validator_keys_mnemonic"));
        }
        if network.network_id == 0 {
            return Err(invalid("network_id", "must be non-zero"));
        }
        if network.seconds_per_slot == 0 {
            return Err(invalid("seconds_per_slot", "must be non-zero"));
        }
        if network.num_validator_keys_per_node == 0 {
            return Err(invalid("num_validator_keys_per_node", "must be non-zero"));
        }
        if network.merge_fork_epoch < network.altair_fork_epoch {
            return Err(invalid("merge_fork_epoch", "must not precede altair_fork_epoch"));
        }

        let deposit_contract_address: Address =
            network.deposit_contract_address.parse().map_err(|e| {
                invalid("deposit_contract_address", format!("not a valid address: {e}"))
            })?;

        let preset = ConsensusPreset::from_slots_per_epoch(network.slots_per_epoch)
            .ok_or(ConfigError::UnsupportedSlotsPerEpoch(network.slots_per_epoch))?;

        let total = NetworkConfig::total_keys(
            self.participants.len(),
            network.num_validator_keys_per_node,
        )?;
        let required = NetworkConfig::min_validator_keys(network.slots_per_epoch);
        if u64::from(total) < required {
            return Err(ConfigError::InsufficientValidatorKeys {
                total,
                required: u32::try_from(required).unwrap_or(u32::MAX),
            });
        }

        Ok(NetworkConfig {
            network_id: network.network_id,
            deposit_contract_address,
            seconds_per_slot: network.seconds_per_slot,
            slots_per_epoch: network.slots_per_epoch,
            preset,
            altair_fork_epoch: network.altair_fork_epoch,
            merge_fork_epoch: network.merge_fork_epoch,
            total_terminal_difficulty: network.total_terminal_difficulty,
            validator_mnemonic: network.preregistered_validator_keys_mnemonic.clone(),
            keys_per_node: network.num_validator_keys_per_node,
            num_participants: self.participants.len(),
        })
    }
}

fn check_client_kinds(params: &Value) -> Result<(), ConfigError> {
    let participants = params.get("participants").and_then(Value::as_array).into_iter().flatten();
    for participant in participants {
        if let Some(kind) = participant.get("el_client_type").and_then(Value::as_str) {
            kind.parse::<ElClientType>()?;
        }
        if let Some(kind) = participant.get("cl_client_type").and_then(Value::as_str) {
            kind.parse::<ClClientType>()?;
        }
    }
    Ok(())
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter { name, reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::find_cause;

    #[test]
    fn test_defaults_validate() {
        let config = TestnetParams::default().validate().unwrap();
        assert_eq!(config.num_participants, 1);
        assert_eq!(config.total_validator_keys().unwrap(), 64);
        assert_eq!(config.preset, ConsensusPreset::Mainnet);
    }

    #[test]
    fn test_empty_json_is_default() {
        let params: TestnetParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, TestnetParams::default());
    }

    #[test]
    fn test_parse_participants() {
        let params: TestnetParams = serde_json::from_str(
            r#"{
                "participants": [
                    { "el_client_type": "geth", "cl_client_type": "lighthouse" },
                    { "el_client_type": "nethermind", "cl_client_type": "teku", "cl_client_log_level": "debug" }
                ],
                "network": { "num_validator_keys_per_node": 32 }
            }"#,
        )
        .unwrap();

        assert_eq!(params.participants.len(), 2);
        assert_eq!(params.participants[1].el_client_type, ElClientType::Nethermind);
        assert_eq!(params.participants[1].cl_log_level(LogLevel::Info), LogLevel::Debug);
        assert_eq!(params.participants[0].cl_log_level(LogLevel::Warn), LogLevel::Warn);
        assert_eq!(params.validate().unwrap().total_validator_keys().unwrap(), 64);
    }

    #[test]
    fn test_unknown_client_type_fails_to_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{ "participants": [ { "el_client_type": "reth" } ] }"#).unwrap();

        let err = TestnetParams::from_file(&path).unwrap_err();
        assert_eq!(
            find_cause::<ConfigError>(&err),
            Some(&ConfigError::UnknownElClient("reth".to_string()))
        );

        let err =
            TestnetParams::from_json(r#"{ "participants": [ { "cl_client_type": "grandine" } ] }"#)
                .unwrap_err();
        assert_eq!(
            find_cause::<ConfigError>(&err),
            Some(&ConfigError::UnknownClClient("grandine".to_string()))
        );
    }

    #[test]
    fn test_client_type_names_are_case_insensitive() {
        let params = TestnetParams::from_json(
            r#"{ "participants": [ { "el_client_type": "Nethermind", "cl_client_type": "TEKU" } ] }"#,
        )
        .unwrap();
        assert_eq!(params.participants[0].el_client_type, ElClientType::Nethermind);
        assert_eq!(params.participants[0].cl_client_type, ClClientType::Teku);
    }

    #[test]
    fn test_rejects_too_few_validator_keys() {
        let mut params = TestnetParams::default();
        params.network.num_validator_keys_per_node = 63;
        assert_eq!(
            params.validate().unwrap_err(),
            ConfigError::InsufficientValidatorKeys { total: 63, required: 64 }
        );

        params.network.slots_per_epoch = 8;
        params.network.num_validator_keys_per_node = 16;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_preset() {
        let mut params = TestnetParams::default();
        params.network.slots_per_epoch = 16;
        assert_eq!(params.validate().unwrap_err(), ConfigError::UnsupportedSlotsPerEpoch(16));
    }

    #[test]
    fn test_rejects_missing_participants() {
        let params = TestnetParams { participants: vec![], ..Default::default() };
        assert_eq!(params.validate().unwrap_err(), ConfigError::MissingParameter("participants"));
    }

    #[test]
    fn test_rejects_bad_deposit_contract() {
        let mut params = TestnetParams::default();
        params.network.deposit_contract_address = "0x42".to_string();
        assert!(matches!(
            params.validate().unwrap_err(),
            ConfigError::InvalidParameter { name: "deposit_contract_address", .. }
        ));
    }

    #[test]
    fn test_image_defaults_and_overrides() {
        let mut spec = ParticipantSpec::new(ElClientType::Besu, ClClientType::Nimbus);
        assert_eq!(spec.el_image(), crate::images::BESU_IMAGE);
        spec.el_client_image = Some("hyperledger/besu:develop".to_string());
        assert_eq!(spec.el_image(), "hyperledger/besu:develop");
        assert_eq!(spec.cl_image(), crate::images::NIMBUS_IMAGE);
    }
}
