//! ERC-20 token metadata.

use crate::chain::ChainClient;
use anyhow::Result;
use ethers::types::Address;
use ethers::utils::to_checksum;
use serde::Serialize;

/// Parse a user-supplied address.
///
/// Accepts an optional `0x` prefix followed by 40 hex digits. Single-case
/// input is taken as is; mixed-case input must carry a valid EIP-55 checksum.
pub fn parse_address(input: &str) -> Option<Address> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let address: Address = format!("0x{}", digits.to_ascii_lowercase()).parse().ok()?;

    let single_case =
        digits == digits.to_ascii_lowercase() || digits == digits.to_ascii_uppercase();
    if single_case || to_checksum(&address, None)[2..] == *digits {
        Some(address)
    } else {
        None
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    /// Echoed as received.
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: String,
    /// Decimal string; may exceed 64 bits.
    pub total_supply: String,
}

/// Read name, symbol, decimals and total supply of `token` concurrently.
pub async fn fetch_token_info(
    client: &dyn ChainClient,
    input: &str,
    token: Address,
) -> Result<TokenInfo> {
    let (name, symbol, decimals, total_supply) = tokio::try_join!(
        client.erc20_name(token),
        client.erc20_symbol(token),
        client.erc20_decimals(token),
        client.erc20_total_supply(token),
    )?;

    Ok(TokenInfo {
        address: input.to_string(),
        name,
        symbol,
        decimals: decimals.to_string(),
        total_supply: total_supply.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockChainClient;

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    #[test]
    fn accepts_well_formed_addresses() {
        let expected: Address = USDC.parse().unwrap();
        assert_eq!(parse_address(USDC), Some(expected));
        assert_eq!(parse_address(&USDC.to_lowercase()), Some(expected));
        assert_eq!(
            parse_address(&format!("0x{}", USDC[2..].to_uppercase())),
            Some(expected)
        );
        assert_eq!(parse_address(&USDC[2..]), Some(expected));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "",
            "0x",
            "hello",
            "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB4",
            "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB488",
            "0xG0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB4 ",
        ] {
            assert_eq!(parse_address(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn rejects_bad_checksum() {
        // Last letter's case flipped.
        assert_eq!(
            parse_address("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eb48"),
            None
        );
    }

    #[tokio::test]
    async fn token_info_serializes_large_supply() {
        let client = MockChainClient::default();
        let info = fetch_token_info(&client, USDC, USDC.parse().unwrap())
            .await
            .unwrap();

        assert_eq!(info.address, USDC);
        assert_eq!(info.name, "USD Coin");
        assert_eq!(info.symbol, "USDC");
        assert_eq!(info.decimals, "6");
        assert_eq!(info.total_supply, "25000000000000000000000");
        assert_eq!(client.call_count(), 4);
    }

    #[tokio::test]
    async fn concurrent_reads_match_sequential_reads() {
        let client = MockChainClient::default();
        let token: Address = USDC.parse().unwrap();
        let info = fetch_token_info(&client, USDC, token).await.unwrap();

        assert_eq!(info.name, client.erc20_name(token).await.unwrap());
        assert_eq!(info.symbol, client.erc20_symbol(token).await.unwrap());
        assert_eq!(
            info.decimals,
            client.erc20_decimals(token).await.unwrap().to_string()
        );
        assert_eq!(
            info.total_supply,
            client.erc20_total_supply(token).await.unwrap().to_string()
        );
    }

    #[tokio::test]
    async fn non_token_contract_fails() {
        let client = MockChainClient::failing(&["erc20_symbol"]);
        let err = fetch_token_info(&client, USDC, USDC.parse().unwrap())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("erc20_symbol"));
    }
}
