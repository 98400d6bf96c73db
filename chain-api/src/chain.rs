//! Chain client adapter.
//!
//! Every chain read the HTTP handlers need goes through [`ChainClient`]. The
//! production implementation talks JSON-RPC through an `ethers` provider and
//! the generated contract bindings; tests swap in an in-memory client.

use crate::contracts::{ChainlinkAggregator, ERC20};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, Bytes, I256, U256, U64};
use std::sync::Arc;
use tracing::warn;

/// One `latestRoundData()` record of a Chainlink aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundData {
    pub round_id: u128,
    pub answer: I256,
    pub started_at: U256,
    pub updated_at: U256,
    pub answered_in_round: u128,
}

impl From<(u128, I256, U256, U256, u128)> for RoundData {
    fn from(
        (round_id, answer, started_at, updated_at, answered_in_round): (
            u128,
            I256,
            U256,
            U256,
            u128,
        ),
    ) -> Self {
        Self {
            round_id,
            answer,
            started_at,
            updated_at,
            answered_in_round,
        }
    }
}

/// Typed read-only access to an EVM node.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn block_number(&self) -> Result<U64>;

    async fn chain_id(&self) -> Result<U256>;

    async fn gas_price(&self) -> Result<U256>;

    /// Deployed bytecode at `address` (empty for EOAs).
    async fn code(&self, address: Address) -> Result<Bytes>;

    async fn erc20_name(&self, token: Address) -> Result<String>;

    async fn erc20_symbol(&self, token: Address) -> Result<String>;

    async fn erc20_decimals(&self, token: Address) -> Result<u8>;

    async fn erc20_total_supply(&self, token: Address) -> Result<U256>;

    async fn feed_latest_answer(&self, feed: Address) -> Result<I256>;

    async fn feed_latest_round_data(&self, feed: Address) -> Result<RoundData>;

    async fn feed_decimals(&self, feed: Address) -> Result<u8>;

    async fn feed_description(&self, feed: Address) -> Result<String>;
}

enum Endpoint {
    Ready(Arc<Provider<Http>>),
    Unavailable(String),
}

/// [`ChainClient`] backed by an HTTP JSON-RPC endpoint.
///
/// Construction never fails. A missing or malformed URL produces a client
/// whose every call returns an error naming the problem.
pub struct RpcChainClient {
    endpoint: Endpoint,
}

impl RpcChainClient {
    pub fn new(rpc_url: Option<&str>) -> Self {
        let endpoint = match rpc_url {
            Some(url) => match Provider::<Http>::try_from(url) {
                Ok(provider) => Endpoint::Ready(Arc::new(provider)),
                Err(e) => {
                    warn!("WEB3_RPC_URL is not a valid URL: {e}");
                    Endpoint::Unavailable(format!("invalid RPC URL: {e}"))
                }
            },
            None => Endpoint::Unavailable("RPC URL not set (WEB3_RPC_URL)".into()),
        };
        Self { endpoint }
    }

    fn provider(&self) -> Result<Arc<Provider<Http>>> {
        match &self.endpoint {
            Endpoint::Ready(provider) => Ok(provider.clone()),
            Endpoint::Unavailable(reason) => Err(anyhow!("{reason}")),
        }
    }

    fn erc20(&self, token: Address) -> Result<ERC20<Provider<Http>>> {
        Ok(ERC20::new(token, self.provider()?))
    }

    fn aggregator(&self, feed: Address) -> Result<ChainlinkAggregator<Provider<Http>>> {
        Ok(ChainlinkAggregator::new(feed, self.provider()?))
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn block_number(&self) -> Result<U64> {
        self.provider()?
            .get_block_number()
            .await
            .context("eth_blockNumber failed")
    }

    async fn chain_id(&self) -> Result<U256> {
        self.provider()?
            .get_chainid()
            .await
            .context("eth_chainId failed")
    }

    async fn gas_price(&self) -> Result<U256> {
        self.provider()?
            .get_gas_price()
            .await
            .context("eth_gasPrice failed")
    }

    async fn code(&self, address: Address) -> Result<Bytes> {
        self.provider()?
            .get_code(address, None)
            .await
            .with_context(|| format!("eth_getCode failed for {address:?}"))
    }

    async fn erc20_name(&self, token: Address) -> Result<String> {
        self.erc20(token)?
            .name()
            .call()
            .await
            .context("name() call failed")
    }

    async fn erc20_symbol(&self, token: Address) -> Result<String> {
        self.erc20(token)?
            .symbol()
            .call()
            .await
            .context("symbol() call failed")
    }

    async fn erc20_decimals(&self, token: Address) -> Result<u8> {
        self.erc20(token)?
            .decimals()
            .call()
            .await
            .context("decimals() call failed")
    }

    async fn erc20_total_supply(&self, token: Address) -> Result<U256> {
        self.erc20(token)?
            .total_supply()
            .call()
            .await
            .context("totalSupply() call failed")
    }

    async fn feed_latest_answer(&self, feed: Address) -> Result<I256> {
        self.aggregator(feed)?
            .latest_answer()
            .call()
            .await
            .context("latestAnswer() call failed")
    }

    async fn feed_latest_round_data(&self, feed: Address) -> Result<RoundData> {
        let round = self
            .aggregator(feed)?
            .latest_round_data()
            .call()
            .await
            .context("latestRoundData() call failed")?;
        Ok(round.into())
    }

    async fn feed_decimals(&self, feed: Address) -> Result<u8> {
        self.aggregator(feed)?
            .decimals()
            .call()
            .await
            .context("decimals() call failed")
    }

    async fn feed_description(&self, feed: Address) -> Result<String> {
        self.aggregator(feed)?
            .description()
            .call()
            .await
            .context("description() call failed")
    }
}
