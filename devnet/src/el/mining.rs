use eyre::{Result, WrapErr, ensure};
use tracing::{debug, info};

use crate::{availability::RetryPolicy, rpc::ElRpcClient};

/// Waits for an execution client to produce its first block.
#[derive(Debug, Clone)]
pub enum MiningWaiter {
    /// The client kind never mines in this devnet, so there is nothing to wait for.
    ///
    /// Erigon, nethermind and besu follow the bootstrap's chain instead of mining, and
    /// return immediately.
    Disabled,
    /// Polls `eth_blockNumber` until the chain height reaches 1.
    BlockHeight {
        /// RPC client of the mining node.
        client: ElRpcClient,
        /// Polling budget.
        policy: RetryPolicy,
    },
}

impl MiningWaiter {
    /// Blocks until the node reports a block height of at least 1.
    pub async fn wait_for_mining(&self) -> Result<()> {
        match self {
            Self::Disabled => {
                debug!("client does not mine, skipping mining wait");
                Ok(())
            }
            Self::BlockHeight { client, policy } => {
                let height = policy
                    .wait(|| {
                        let client = client.clone();
                        async move {
                            let height = client.block_number().await?;
                            ensure!(height >= 1, "chain height is still {height}");
                            Ok(height)
                        }
                    })
                    .await
                    .wrap_err_with(|| format!("No block was mined at {}", client.url()))?;

                info!(height, url = %client.url(), "first block mined");
                Ok(())
            }
        }
    }
}
