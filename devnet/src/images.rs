//! Default Docker images for every supported client and tool.

/// Image bundling the genesis generators and validator keystore tooling.
pub const PRELAUNCH_IMAGE: &str = "ethpandaops/ethereum-genesis-generator:1.3.4";

/// Default geth image.
pub const GETH_IMAGE: &str = "ethereum/client-go:v1.10.26";
/// Default erigon image.
pub const ERIGON_IMAGE: &str = "thorax/erigon:v2.29.0";
/// Default nethermind image.
pub const NETHERMIND_IMAGE: &str = "nethermind/nethermind:1.14.6";
/// Default besu image.
pub const BESU_IMAGE: &str = "hyperledger/besu:22.10.1";

/// Default lighthouse image.
pub const LIGHTHOUSE_IMAGE: &str = "sigp/lighthouse:v3.3.0";
/// Default lodestar image.
pub const LODESTAR_IMAGE: &str = "chainsafe/lodestar:v1.2.2";
/// Default nimbus image.
pub const NIMBUS_IMAGE: &str = "statusim/nimbus-eth2:multiarch-v22.11.1";
/// Default prysm beacon node image.
pub const PRYSM_BEACON_IMAGE: &str = "gcr.io/prysmaticlabs/prysm/beacon-chain:v3.2.0";
/// Default prysm validator client image.
pub const PRYSM_VALIDATOR_IMAGE: &str = "gcr.io/prysmaticlabs/prysm/validator:v3.2.0";
/// Default teku image.
pub const TEKU_IMAGE: &str = "consensys/teku:22.11.0";
