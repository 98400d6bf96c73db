//! Chainlink price retrieval.
//!
//! Each supported pair is read from its aggregator through an ordered list of
//! read strategies. Strategies are tried in order and the first one that
//! succeeds produces the quote. Aggregator versions differ in which read
//! methods they answer, so the ETH/USD feed tries the single-value
//! `latestAnswer()` first and falls back to `latestRoundData()`.

use crate::chain::ChainClient;
use crate::contracts::KnownContract;
use anyhow::{anyhow, Result};
use chrono::{DateTime, SecondsFormat};
use ethers::types::{Address, I256, U256};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{debug, warn};

/// Price pairs served by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPair {
    EthUsd,
    BtcUsd,
}

/// How a quote is read from an aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMethod {
    /// `latestAnswer()`: price only.
    LatestAnswer,
    /// `latestRoundData()`: price plus round id and update time.
    LatestRoundData,
}

impl ReadMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadMethod::LatestAnswer => "latestAnswer",
            ReadMethod::LatestRoundData => "latestRoundData",
        }
    }
}

impl FeedPair {
    pub fn label(self) -> &'static str {
        match self {
            FeedPair::EthUsd => "ETH/USD",
            FeedPair::BtcUsd => "BTC/USD",
        }
    }

    pub fn contract(self) -> KnownContract {
        match self {
            FeedPair::EthUsd => KnownContract::ChainlinkEthUsd,
            FeedPair::BtcUsd => KnownContract::ChainlinkBtcUsd,
        }
    }

    /// Read strategies in the order they are attempted.
    ///
    /// BTC/USD has no fallback tier.
    pub fn strategies(self) -> &'static [ReadMethod] {
        match self {
            FeedPair::EthUsd => &[ReadMethod::LatestAnswer, ReadMethod::LatestRoundData],
            FeedPair::BtcUsd => &[ReadMethod::LatestRoundData],
        }
    }

    /// Only pairs with more than one strategy report which one answered.
    fn reports_method(self) -> bool {
        self.strategies().len() > 1
    }
}

/// A price read from a Chainlink feed, shaped for the HTTP response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub pair: &'static str,
    pub price: String,
    pub raw_price: String,
    pub decimals: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<&'static str>,
    pub contract_address: String,
}

/// Every strategy of a pair failed.
#[derive(Debug)]
pub struct PriceFetchError {
    pub pair: FeedPair,
    pub failures: Vec<(ReadMethod, anyhow::Error)>,
}

impl PriceFetchError {
    /// `"<method>: <message>"` per attempted strategy, joined with `"; "`.
    pub fn details(&self) -> String {
        self.failures
            .iter()
            .map(|(method, err)| format!("{}: {err:#}", method.as_str()))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Fetch the current quote for `pair`, trying its strategies in order.
pub async fn fetch_quote(
    client: &dyn ChainClient,
    pair: FeedPair,
) -> Result<PriceQuote, PriceFetchError> {
    let feed = pair.contract().address();
    let mut failures = Vec::new();

    for &method in pair.strategies() {
        match read_with(client, feed, method)
            .await
            .and_then(|reading| reading.into_quote(pair, method))
        {
            Ok(quote) => {
                debug!(pair = pair.label(), method = method.as_str(), "price read");
                return Ok(quote);
            }
            Err(e) => {
                warn!(
                    pair = pair.label(),
                    method = method.as_str(),
                    "price read failed: {e:#}"
                );
                failures.push((method, e));
            }
        }
    }

    Err(PriceFetchError { pair, failures })
}

/// Raw values gathered by one strategy.
struct FeedReading {
    answer: I256,
    decimals: u8,
    description: String,
    round: Option<(u128, U256)>,
}

impl FeedReading {
    /// Fails when the round's update time cannot be rendered.
    fn into_quote(self, pair: FeedPair, method: ReadMethod) -> Result<PriceQuote> {
        let (round_id, last_updated) = match self.round {
            Some((round_id, updated_at)) => (
                Some(round_id.to_string()),
                Some(format_updated_at(updated_at)?),
            ),
            None => (None, None),
        };

        Ok(PriceQuote {
            pair: pair.label(),
            price: format_price(self.answer, self.decimals),
            raw_price: self.answer.to_string(),
            decimals: self.decimals.to_string(),
            description: self.description,
            round_id,
            last_updated,
            method: pair.reports_method().then_some(method.as_str()),
            contract_address: pair.contract().checksummed(),
        })
    }
}

async fn read_with(
    client: &dyn ChainClient,
    feed: Address,
    method: ReadMethod,
) -> Result<FeedReading> {
    match method {
        ReadMethod::LatestAnswer => {
            let (answer, decimals, description) = tokio::try_join!(
                client.feed_latest_answer(feed),
                client.feed_decimals(feed),
                client.feed_description(feed),
            )?;
            Ok(FeedReading {
                answer,
                decimals,
                description,
                round: None,
            })
        }
        ReadMethod::LatestRoundData => {
            let (round, decimals, description) = tokio::try_join!(
                client.feed_latest_round_data(feed),
                client.feed_decimals(feed),
                client.feed_description(feed),
            )?;
            Ok(FeedReading {
                answer: round.answer,
                decimals,
                description,
                round: Some((round.round_id, round.updated_at)),
            })
        }
    }
}

/// `answer / 10^decimals` with two fractional digits.
///
/// Computed in `f64`: this is a display value, not an exact conversion. The
/// `f64` is rounded at its exact binary value with ties away from zero, so
/// `3.125` renders as `3.13` while `1.005` (stored just below) stays `1.00`.
pub fn format_price(answer: I256, decimals: u8) -> String {
    let raw: f64 = answer.to_string().parse().unwrap_or(f64::NAN);
    let price = raw / 10f64.powi(i32::from(decimals));
    match Decimal::from_f64_retain(price) {
        Some(exact) => {
            let rounded = exact.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{rounded:.2}")
        }
        // Beyond Decimal's range or not finite.
        None => format!("{price:.2}"),
    }
}

/// Feed update time (seconds since epoch) as RFC 3339 UTC with milliseconds.
pub fn format_updated_at(updated_at: U256) -> Result<String> {
    if updated_at > U256::from(i64::MAX as u64) {
        return Err(anyhow!("updatedAt out of range: {updated_at}"));
    }
    let time = DateTime::from_timestamp(updated_at.as_u64() as i64, 0)
        .ok_or_else(|| anyhow!("updatedAt out of range: {updated_at}"))?;
    Ok(time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockChainClient;

    #[test]
    fn price_is_scaled_and_rounded() {
        assert_eq!(format_price(I256::from(123_456_789_012i64), 8), "1234.57");
        assert_eq!(format_price(I256::from(200_000_000i64), 8), "2.00");
        assert_eq!(format_price(I256::from(-150_000_000i64), 8), "-1.50");
        assert_eq!(format_price(I256::from(42i64), 0), "42.00");
    }

    #[test]
    fn price_ties_round_away_from_zero() {
        assert_eq!(format_price(I256::from(312_500_000i64), 8), "3.13");
        assert_eq!(format_price(I256::from(-112_500_000i64), 8), "-1.13");
        assert_eq!(format_price(I256::from(345_612_500_000i64), 8), "3456.13");
        // 1.005 is stored as 1.00499999..., not a tie.
        assert_eq!(format_price(I256::from(100_500_000i64), 8), "1.00");
    }

    #[test]
    fn updated_at_is_iso8601_millis() {
        assert_eq!(
            format_updated_at(U256::from(1_700_000_000u64)).unwrap(),
            "2023-11-14T22:13:20.000Z"
        );
        assert_eq!(
            format_updated_at(U256::zero()).unwrap(),
            "1970-01-01T00:00:00.000Z"
        );
        assert!(format_updated_at(U256::MAX).is_err());
    }

    #[test]
    fn strategy_order() {
        assert_eq!(
            FeedPair::EthUsd.strategies(),
            &[ReadMethod::LatestAnswer, ReadMethod::LatestRoundData]
        );
        assert_eq!(FeedPair::BtcUsd.strategies(), &[ReadMethod::LatestRoundData]);
    }

    #[tokio::test]
    async fn eth_uses_latest_answer_when_available() {
        let client = MockChainClient::default();
        let quote = fetch_quote(&client, FeedPair::EthUsd).await.unwrap();

        assert_eq!(quote.method, Some("latestAnswer"));
        assert_eq!(quote.price, "1234.57");
        assert_eq!(quote.raw_price, "123456789012");
        assert_eq!(quote.decimals, "8");
        assert_eq!(quote.round_id, None);
        assert_eq!(quote.last_updated, None);
        assert_eq!(
            quote.contract_address,
            "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419"
        );
        // latestAnswer, decimals, description
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn eth_falls_back_to_round_data() {
        let client = MockChainClient::failing(&["feed_latest_answer"]);
        let quote = fetch_quote(&client, FeedPair::EthUsd).await.unwrap();

        assert_eq!(quote.method, Some("latestRoundData"));
        assert_eq!(quote.price, "1234.00");
        assert_eq!(quote.round_id.as_deref(), Some("110680464442257320000"));
        assert_eq!(
            quote.last_updated.as_deref(),
            Some("2023-11-14T22:13:20.000Z")
        );
    }

    #[tokio::test]
    async fn eth_reports_every_failed_tier() {
        let client = MockChainClient::failing(&["feed_latest_answer", "feed_description"]);
        let err = fetch_quote(&client, FeedPair::EthUsd).await.unwrap_err();

        // description fails in both tiers
        assert_eq!(err.failures.len(), 2);
        let details = err.details();
        assert!(details.starts_with("latestAnswer: "), "{details}");
        assert!(details.contains("; latestRoundData: "), "{details}");
    }

    #[tokio::test]
    async fn btc_has_no_fallback_tier() {
        let client = MockChainClient::failing(&["feed_latest_round_data"]);
        let err = fetch_quote(&client, FeedPair::BtcUsd).await.unwrap_err();

        assert_eq!(err.pair, FeedPair::BtcUsd);
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].0, ReadMethod::LatestRoundData);
    }

    #[tokio::test]
    async fn btc_quote_omits_method() {
        let client = MockChainClient::default();
        let quote = fetch_quote(&client, FeedPair::BtcUsd).await.unwrap();

        assert_eq!(quote.method, None);
        assert!(quote.round_id.is_some());

        let json = serde_json::to_value(&quote).unwrap();
        assert!(json.get("method").is_none());
        assert_eq!(json["pair"], "BTC/USD");
        assert_eq!(json["lastUpdated"], "2023-11-14T22:13:20.000Z");
        assert_eq!(
            json["contractAddress"],
            "0xF4030086522a5bEEa4988F8cA5B36dbC97BeE88c"
        );
    }

    #[tokio::test]
    async fn unrenderable_update_time_fails_the_tier() {
        let mut client = MockChainClient::default();
        client.round.updated_at = U256::MAX;

        let err = fetch_quote(&client, FeedPair::BtcUsd).await.unwrap_err();
        assert_eq!(err.failures.len(), 1);
        assert!(err.details().contains("updatedAt out of range"), "{}", err.details());

        client.failing.insert("feed_latest_answer");
        let err = fetch_quote(&client, FeedPair::EthUsd).await.unwrap_err();
        assert_eq!(err.failures.len(), 2);
        assert_eq!(err.failures[1].0, ReadMethod::LatestRoundData);
    }
}
