//! The closed set of supported client implementations.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

use crate::{error::ConfigError, images};

/// Execution-layer client implementation.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ElClientType {
    /// go-ethereum.
    #[default]
    Geth,
    /// Erigon.
    Erigon,
    /// Nethermind.
    Nethermind,
    /// Hyperledger Besu.
    Besu,
}

impl ElClientType {
    /// Image used when the participant does not override it.
    pub const fn default_image(&self) -> &'static str {
        match self {
            Self::Geth => images::GETH_IMAGE,
            Self::Erigon => images::ERIGON_IMAGE,
            Self::Nethermind => images::NETHERMIND_IMAGE,
            Self::Besu => images::BESU_IMAGE,
        }
    }
}

impl FromStr for ElClientType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::iter()
            .find(|kind| kind.as_ref().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownElClient(s.to_string()))
    }
}

impl TryFrom<String> for ElClientType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Consensus-layer client implementation.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ClClientType {
    /// Lighthouse (separate beacon and validator processes).
    #[default]
    Lighthouse,
    /// Lodestar (separate beacon and validator processes).
    Lodestar,
    /// Nimbus (single process).
    Nimbus,
    /// Prysm (separate beacon and validator processes).
    Prysm,
    /// Teku (single process).
    Teku,
}

impl ClClientType {
    /// Image used when the participant does not override it.
    ///
    /// Prysm ships beacon and validator as separate images; they are joined with a
    /// comma here and split again by its launcher.
    pub fn default_image(&self) -> String {
        match self {
            Self::Lighthouse => images::LIGHTHOUSE_IMAGE.to_string(),
            Self::Lodestar => images::LODESTAR_IMAGE.to_string(),
            Self::Nimbus => images::NIMBUS_IMAGE.to_string(),
            Self::Prysm => {
                format!("{},{}", images::PRYSM_BEACON_IMAGE, images::PRYSM_VALIDATOR_IMAGE)
            }
            Self::Teku => images::TEKU_IMAGE.to_string(),
        }
    }

    /// Whether beacon and validator run as two services.
    pub const fn has_separate_validator(&self) -> bool {
        matches!(self, Self::Lighthouse | Self::Lodestar | Self::Prysm)
    }
}

impl FromStr for ClClientType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::iter()
            .find(|kind| kind.as_ref().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownClClient(s.to_string()))
    }
}

impl TryFrom<String> for ClClientType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
