//! `NetworkSummary` type describing a running devnet.

use std::{fmt, path::Path};

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::{
    cl::ClClientSummary, el::ElClientSummary, genesis::GenesisPaths, participant::Participant,
};

/// File name of the summary inside the output directory.
pub const SUMMARY_FILE: &str = "network.json";

/// One participant's EL and CL endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    /// Launch position.
    pub ordinal: usize,
    /// Execution client.
    pub el: ElClientSummary,
    /// Consensus client.
    pub cl: ClClientSummary,
}

impl From<&Participant> for ParticipantSummary {
    fn from(participant: &Participant) -> Self {
        Self {
            ordinal: participant.ordinal,
            el: participant.el.as_ref().into(),
            cl: participant.cl.as_ref().into(),
        }
    }
}

/// Identities and endpoints of every participant of a devnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSummary {
    /// Execution chain id.
    pub network_id: u64,
    /// Generated genesis files.
    pub genesis: GenesisPaths,
    /// Participants in launch order.
    pub participants: Vec<ParticipantSummary>,
}

impl fmt::Display for NetworkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Network {} (genesis at {})", self.network_id, self.genesis.timestamp)?;
        writeln!(f, "  EL genesis: {}", self.genesis.el_genesis_dir)?;
        writeln!(f, "  CL genesis: {}", self.genesis.cl_genesis_dir)?;
        writeln!(f)?;
        writeln!(f, "{:<4} {:<12} {:<28} {:<12} {:<28}", "#", "EL", "EL RPC", "CL", "Beacon API")?;
        write!(f, "{}", "-".repeat(88))?;
        for participant in &self.participants {
            writeln!(f)?;
            write!(
                f,
                "{:<4} {:<12} {:<28} {:<12} {:<28}",
                participant.ordinal,
                participant.el.client_type,
                participant.el.rpc_url,
                participant.cl.client_type,
                participant.cl.beacon_url,
            )?;
        }
        Ok(())
    }
}

impl NetworkSummary {
    /// Read a `NetworkSummary` from a JSON file.
    pub fn read_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse {}", path.display()))
    }

    /// Write the `NetworkSummary` to a JSON file.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .wrap_err_with(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClClientType, ElClientType};

    fn summary() -> NetworkSummary {
        NetworkSummary {
            network_id: 3_151_908,
            genesis: GenesisPaths {
                timestamp: 1_700_000_000,
                el_genesis_dir: "/tmp/devnet/el-genesis".to_string(),
                cl_genesis_dir: "/tmp/devnet/cl-genesis".to_string(),
                jwt_secret: "/tmp/devnet/jwt/jwtsecret".to_string(),
            },
            participants: vec![ParticipantSummary {
                ordinal: 0,
                el: ElClientSummary {
                    client_type: ElClientType::Geth,
                    service_name: "el-0-geth".to_string(),
                    enode: "enode://aa@172.18.0.2:30303".to_string(),
                    enr: None,
                    rpc_url: "http://127.0.0.1:49153/".to_string(),
                    engine_url: "http://172.18.0.2:8551".to_string(),
                },
                cl: ClClientSummary {
                    client_type: ClClientType::Teku,
                    service_name: "cl-0-teku".to_string(),
                    validator_service_name: None,
                    enr: "enr:-abc".to_string(),
                    beacon_url: "http://127.0.0.1:49160/".to_string(),
                    metrics: vec![],
                },
            }],
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUMMARY_FILE);

        let summary = summary();
        summary.write_to_file(&path).unwrap();
        assert_eq!(NetworkSummary::read_from_file(&path).unwrap(), summary);
    }

    #[test]
    fn test_display_lists_participants() {
        let rendered = summary().to_string();
        assert!(rendered.contains("Network 3151908"));
        assert!(rendered.contains("geth"));
        assert!(rendered.contains("http://127.0.0.1:49160/"));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = NetworkSummary::read_from_file(&dir.path().join(SUMMARY_FILE)).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
