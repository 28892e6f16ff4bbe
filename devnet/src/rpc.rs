//! Clients for the node endpoints the orchestrator probes.
//!
//! - Execution clients: JSON-RPC through an alloy provider (`admin_nodeInfo`, `eth_blockNumber`).
//! - Beacon nodes: the standard REST API (`/eth/v1/node/health`, `/eth/v1/node/identity`).

use std::time::Duration;

use alloy_provider::{Provider, RootProvider};
use eyre::{Result, WrapErr, bail, eyre};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::timeout;
use url::Url;

/// Per-request timeout so a hung endpoint cannot stall a retry loop.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const HEALTH_PATH: &str = "eth/v1/node/health";
const IDENTITY_PATH: &str = "eth/v1/node/identity";

/// Response of `admin_nodeInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeInfo {
    /// Enode URL of the node.
    pub enode: String,
    /// ENR, if the client exposes one.
    #[serde(default)]
    pub enr: Option<String>,
    /// Node id.
    #[serde(default)]
    pub id: Option<String>,
    /// Client version string.
    #[serde(default)]
    pub name: Option<String>,
}

/// JSON-RPC client for an execution client.
#[derive(Debug, Clone)]
pub struct ElRpcClient {
    provider: RootProvider,
    url: Url,
}

impl ElRpcClient {
    /// Creates a client for the given RPC URL.
    pub fn new(url: Url) -> Self {
        Self { provider: RootProvider::new_http(url.clone()), url }
    }

    /// Returns the RPC URL.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Calls `admin_nodeInfo`.
    pub async fn node_info(&self) -> Result<NodeInfo> {
        let request = self.provider.raw_request::<(), NodeInfo>("admin_nodeInfo".into(), ());
        timeout(REQUEST_TIMEOUT, request)
            .await
            .wrap_err("admin_nodeInfo timed out")?
            .wrap_err("Failed to call admin_nodeInfo")
    }

    /// Returns the current block height.
    pub async fn block_number(&self) -> Result<u64> {
        timeout(REQUEST_TIMEOUT, self.provider.get_block_number())
            .await
            .wrap_err("eth_blockNumber timed out")?
            .wrap_err("Failed to get block number")
    }
}

/// Beacon node health as signalled by the status code of `/eth/v1/node/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconHealth {
    /// `200`: synced and ready.
    Ready,
    /// `206`: up but syncing, some data may be incomplete.
    SyncingWithIncompleteData,
    /// `503`: not initialized or having issues.
    Error,
}

impl BeaconHealth {
    /// Maps a health endpoint status code; unknown codes yield `None`.
    pub const fn from_status(status: u16) -> Option<Self> {
        match status {
            200 => Some(Self::Ready),
            206 => Some(Self::SyncingWithIncompleteData),
            503 => Some(Self::Error),
            _ => None,
        }
    }
}

/// The `data` payload of `/eth/v1/node/identity`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeIdentity {
    /// libp2p peer id.
    #[serde(default)]
    pub peer_id: String,
    /// Ethereum Node Record.
    pub enr: String,
    /// Advertised libp2p addresses.
    #[serde(default)]
    pub p2p_addresses: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    data: T,
}

/// Minimal client for the beacon node REST API.
#[derive(Debug, Clone)]
pub struct BeaconClient {
    client: reqwest::Client,
    base_url: Url,
}

impl BeaconClient {
    /// Creates a client for the given beacon API base URL.
    pub fn new(base_url: Url) -> Self {
        Self { client: reqwest::Client::new(), base_url }
    }

    /// Returns the beacon API base URL.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Queries the health endpoint. Status codes outside the documented set are errors.
    pub async fn health(&self) -> Result<BeaconHealth> {
        let url = self.base_url.join(HEALTH_PATH)?;
        let resp = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .wrap_err("Failed to query beacon health")?;

        let status = resp.status().as_u16();
        BeaconHealth::from_status(status)
            .ok_or_else(|| eyre!("beacon health returned unexpected status {status}"))
    }

    /// Fetches the node's own identity, including its ENR.
    pub async fn identity(&self) -> Result<NodeIdentity> {
        let url = self.base_url.join(IDENTITY_PATH)?;
        let resp = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .wrap_err("Failed to query beacon identity")?
            .error_for_status()
            .wrap_err("Beacon identity request failed")?;

        let body: Value = resp.json().await.wrap_err("Failed to read beacon identity")?;
        parse_identity(body)
    }
}

fn parse_identity(body: Value) -> Result<NodeIdentity> {
    let response: DataResponse<NodeIdentity> =
        serde_json::from_value(body).wrap_err("Failed to parse beacon identity")?;
    if response.data.enr.is_empty() {
        bail!("beacon identity has an empty ENR");
    }
    Ok(response.data)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(200, Some(BeaconHealth::Ready))]
    #[case(206, Some(BeaconHealth::SyncingWithIncompleteData))]
    #[case(503, Some(BeaconHealth::Error))]
    #[case(404, None)]
    fn test_beacon_health_from_status(#[case] status: u16, #[case] expected: Option<BeaconHealth>) {
        assert_eq!(BeaconHealth::from_status(status), expected);
    }

    #[test]
    fn test_node_info_deserializes() {
        let info: NodeInfo = serde_json::from_value(json!({
            "enode": "enode://abcd@172.18.0.2:30303",
            "enr": "enr:-Iq4QAbc",
            "id": "ff",
            "name": "Geth/v1.10.26",
            "ports": { "discovery": 30303, "listener": 30303 }
        }))
        .unwrap();
        assert_eq!(info.enode, "enode://abcd@172.18.0.2:30303");
        assert_eq!(info.enr.as_deref(), Some("enr:-Iq4QAbc"));
    }

    #[test]
    fn test_node_info_without_enr() {
        let info: NodeInfo =
            serde_json::from_value(json!({ "enode": "enode://ef@1.2.3.4:30303" })).unwrap();
        assert!(info.enr.is_none());
    }

    #[tokio::test]
    async fn test_el_client_unreachable_endpoint_errors() {
        let client = ElRpcClient::new(Url::parse("http://127.0.0.1:1").unwrap());
        assert!(client.node_info().await.is_err());
        assert!(client.block_number().await.is_err());
    }

    #[test]
    fn test_parse_identity() {
        let body = json!({
            "data": {
                "peer_id": "16Uiu2HAm",
                "enr": "enr:-LK4QH",
                "p2p_addresses": ["/ip4/172.18.0.3/tcp/9000"],
                "discovery_addresses": [],
                "metadata": { "seq_number": "1", "attnets": "0x00" }
            }
        });
        let identity = parse_identity(body).unwrap();
        assert_eq!(identity.enr, "enr:-LK4QH");
        assert_eq!(identity.p2p_addresses.len(), 1);
    }

    #[test]
    fn test_parse_identity_rejects_empty_enr() {
        assert!(parse_identity(json!({ "data": { "enr": "" } })).is_err());
    }
}
