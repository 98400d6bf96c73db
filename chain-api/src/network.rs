//! Network summary: chain identity, head, gas price and contract liveness.

use crate::chain::ChainClient;
use crate::contracts::KnownContract;
use anyhow::Result;
use ethers::types::{Bytes, U256};
use serde::Serialize;

/// Human-readable name for a chain id.
pub fn network_name(chain_id: U256) -> String {
    let known = u64::try_from(chain_id).ok().and_then(|id| match id {
        1 => Some("Ethereum Mainnet"),
        5 => Some("Goerli Testnet"),
        137 => Some("Polygon Mainnet"),
        11_155_111 => Some("Sepolia Testnet"),
        _ => None,
    });
    match known {
        Some(name) => name.to_string(),
        None => format!("Unknown (Chain ID: {chain_id})"),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub chain_id: String,
    pub name: String,
    pub block_number: String,
    pub gas_price: String,
}

/// Bytecode presence at a known address.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCode {
    pub address: String,
    pub has_code: bool,
    /// Length of the `0x`-prefixed hex rendering, so an empty account is 2.
    pub code_length: usize,
}

impl ContractCode {
    fn new(contract: KnownContract, code: &Bytes) -> Self {
        let code_length = 2 + 2 * code.len();
        Self {
            address: contract.checksummed(),
            has_code: code_length > 2,
            code_length,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractsReport {
    pub usdc: ContractCode,
    pub eth_usd: ContractCode,
    pub btc_usd: ContractCode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkReport {
    pub network: NetworkInfo,
    pub rpc_url: &'static str,
    pub contracts: ContractsReport,
}

/// Query the node for everything `/network` reports, all reads in parallel.
pub async fn fetch_network_report(
    client: &dyn ChainClient,
    rpc_url: &'static str,
) -> Result<NetworkReport> {
    let (block_number, chain_id, gas_price, usdc_code, eth_usd_code, btc_usd_code) = tokio::try_join!(
        client.block_number(),
        client.chain_id(),
        client.gas_price(),
        client.code(KnownContract::Usdc.address()),
        client.code(KnownContract::ChainlinkEthUsd.address()),
        client.code(KnownContract::ChainlinkBtcUsd.address()),
    )?;

    Ok(NetworkReport {
        network: NetworkInfo {
            chain_id: chain_id.to_string(),
            name: network_name(chain_id),
            block_number: block_number.to_string(),
            gas_price: gas_price.to_string(),
        },
        rpc_url,
        contracts: ContractsReport {
            usdc: ContractCode::new(KnownContract::Usdc, &usdc_code),
            eth_usd: ContractCode::new(KnownContract::ChainlinkEthUsd, &eth_usd_code),
            btc_usd: ContractCode::new(KnownContract::ChainlinkBtcUsd, &btc_usd_code),
        },
    })
}
