//! Devnet configuration: user parameters, the validated network config and log levels.

mod log_level;
pub use log_level::{LogLevel, LogLevelTable};

mod network;
pub use network::{ConsensusPreset, NetworkConfig};

mod params;
pub use params::{
    DEFAULT_VALIDATOR_MNEMONIC, LaunchParams, NetworkParams, ParticipantSpec, TestnetParams,
};
