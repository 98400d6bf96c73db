//! Contract bindings and the fixed table of well-known mainnet addresses.

use ethers::contract::abigen;
use ethers::types::Address;
use ethers::utils::to_checksum;
use std::sync::LazyLock;

// ERC-20 read subset
abigen!(
    ERC20,
    r#"[
        function name() external view returns (string)
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
        function totalSupply() external view returns (uint256)
        function balanceOf(address _owner) external view returns (uint256 balance)
    ]"#,
);

// Chainlink aggregator (proxy) read subset
abigen!(
    ChainlinkAggregator,
    r#"[
        function decimals() external view returns (uint8)
        function description() external view returns (string)
        function getRoundData(uint80 _roundId) external view returns (uint80 roundId, int256 answer, uint256 startedAt, uint256 updatedAt, uint80 answeredInRound)
        function latestAnswer() external view returns (int256)
        function latestRound() external view returns (uint256)
        function latestRoundData() external view returns (uint80 roundId, int256 answer, uint256 startedAt, uint256 updatedAt, uint80 answeredInRound)
        function latestTimestamp() external view returns (uint256)
        function version() external view returns (uint256)
    ]"#,
);

/// Contracts the service knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownContract {
    Usdc,
    Weth,
    Dai,
    ChainlinkEthUsd,
    ChainlinkBtcUsd,
}

/// Addresses parsed on first use, indexed by discriminant.
static ADDRESSES: LazyLock<[Address; 5]> = LazyLock::new(|| {
    KnownContract::ALL.map(|contract| {
        contract
            .literal()
            .parse::<Address>()
            .expect("Invalid address in contract table")
    })
});

impl KnownContract {
    pub const ALL: [KnownContract; 5] = [
        KnownContract::Usdc,
        KnownContract::Weth,
        KnownContract::Dai,
        KnownContract::ChainlinkEthUsd,
        KnownContract::ChainlinkBtcUsd,
    ];

    /// Symbolic name, as used in logs.
    pub fn name(self) -> &'static str {
        match self {
            KnownContract::Usdc => "USDC",
            KnownContract::Weth => "WETH",
            KnownContract::Dai => "DAI",
            KnownContract::ChainlinkEthUsd => "CHAINLINK_ETH_USD",
            KnownContract::ChainlinkBtcUsd => "CHAINLINK_BTC_USD",
        }
    }

    /// Checksummed address literal.
    fn literal(self) -> &'static str {
        match self {
            KnownContract::Usdc => "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            KnownContract::Weth => "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2",
            KnownContract::Dai => "0x6B175474E89094C44Da98b954EedeAC495271d0F",
            KnownContract::ChainlinkEthUsd => "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419",
            KnownContract::ChainlinkBtcUsd => "0xF4030086522a5bEEa4988F8cA5B36dbC97BeE88c",
        }
    }

    pub fn address(self) -> Address {
        ADDRESSES[self as usize]
    }

    /// EIP-55 rendering of [`KnownContract::address`].
    pub fn checksummed(self) -> String {
        to_checksum(&self.address(), None)
    }
}
