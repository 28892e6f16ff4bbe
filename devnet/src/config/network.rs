//! Validated, immutable network parameters shared by every launch.

use alloy_primitives::Address;
use serde::Serialize;

use crate::error::ConfigError;

/// Consensus spec preset, selected by slots per epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConsensusPreset {
    /// 32 slots per epoch.
    Mainnet,
    /// 8 slots per epoch.
    Minimal,
}

impl ConsensusPreset {
    /// Returns the preset matching `slots_per_epoch`, if any.
    pub const fn from_slots_per_epoch(slots_per_epoch: u64) -> Option<Self> {
        match slots_per_epoch {
            32 => Some(Self::Mainnet),
            8 => Some(Self::Minimal),
            _ => None,
        }
    }

    /// Name as it appears in `PRESET_BASE`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Minimal => "minimal",
        }
    }
}

/// Network-wide parameters. Built once by
/// [`TestnetParams::validate`](super::TestnetParams::validate) and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    /// Execution chain and network id.
    pub network_id: u64,
    /// Deposit contract address baked into both genesis files.
    pub deposit_contract_address: Address,
    /// Slot duration.
    pub seconds_per_slot: u64,
    /// Slots per epoch.
    pub slots_per_epoch: u64,
    /// Consensus preset implied by `slots_per_epoch`.
    pub preset: ConsensusPreset,
    /// Altair fork epoch.
    pub altair_fork_epoch: u64,
    /// Merge (Bellatrix) fork epoch.
    pub merge_fork_epoch: u64,
    /// Terminal total difficulty triggering the merge transition.
    pub total_terminal_difficulty: u64,
    /// Mnemonic all validator keys derive from.
    #[serde(skip)]
    pub validator_mnemonic: String,
    /// Validator keys generated per participant.
    pub keys_per_node: u32,
    /// Number of participants the network is built for.
    pub num_participants: usize,
}

impl NetworkConfig {
    /// Total validator keys across all participants.
    pub fn total_validator_keys(&self) -> Result<u32, ConfigError> {
        Self::total_keys(self.num_participants, self.keys_per_node)
    }

    /// Multiplies out the key count, rejecting totals that do not fit a `u32`.
    pub fn total_keys(num_participants: usize, keys_per_node: u32) -> Result<u32, ConfigError> {
        u32::try_from(num_participants)
            .ok()
            .and_then(|participants| participants.checked_mul(keys_per_node))
            .ok_or(ConfigError::InvalidParameter {
                name: "num_validator_keys_per_node",
                reason: format!("{num_participants} participants x {keys_per_node} keys overflows"),
            })
    }

    /// Smallest validator set the network accepts: two full epochs of proposers.
    pub const fn min_validator_keys(slots_per_epoch: u64) -> u64 {
        2 * slots_per_epoch
    }
}
