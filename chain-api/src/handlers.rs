//! HTTP request handlers.

use crate::chain::ChainClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::network::{fetch_network_report, NetworkReport};
use crate::price::{fetch_quote, FeedPair, PriceQuote};
use crate::token::{fetch_token_info, parse_address, TokenInfo};
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn ChainClient>,
    pub config: Arc<Config>,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: [&'static str; 4],
}

/// GET / - Service banner.
pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Blockchain API - Smart Contract Data API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: [
            "GET /token/:address - Get ERC-20 token info",
            "GET /price/eth - Get ETH/USD price from Chainlink",
            "GET /price/btc - Get BTC/USD price from Chainlink",
            "GET /network - Get network information",
        ],
    })
}

/// GET /network - Chain id, head block, gas price and contract liveness.
pub async fn network(State(state): State<AppState>) -> Result<Json<NetworkReport>, ApiError> {
    fetch_network_report(state.client.as_ref(), state.config.rpc_provider_label())
        .await
        .map(Json)
        .map_err(|e| ApiError::Network {
            message: format!("{e:#}"),
            rpc_url: state.config.rpc_status_label(),
        })
}

/// GET /token/{address} - ERC-20 metadata.
pub async fn token(
    State(state): State<AppState>,
    address: Result<Path<String>, PathRejection>,
) -> Result<Json<TokenInfo>, ApiError> {
    let Path(address) = address.map_err(|e| {
        debug!("rejected token path: {e}");
        ApiError::InvalidAddress
    })?;
    let Some(token) = parse_address(&address) else {
        debug!(%address, "rejected token address");
        return Err(ApiError::InvalidAddress);
    };

    fetch_token_info(state.client.as_ref(), &address, token)
        .await
        .map(Json)
        .map_err(|e| ApiError::Token {
            details: format!("{e:#}"),
        })
}

/// GET /price/eth - ETH/USD from Chainlink, with method fallback.
pub async fn price_eth(State(state): State<AppState>) -> Result<Json<PriceQuote>, ApiError> {
    price(&state, FeedPair::EthUsd).await
}

/// GET /price/btc - BTC/USD from Chainlink.
pub async fn price_btc(State(state): State<AppState>) -> Result<Json<PriceQuote>, ApiError> {
    price(&state, FeedPair::BtcUsd).await
}

async fn price(state: &AppState, pair: FeedPair) -> Result<Json<PriceQuote>, ApiError> {
    Ok(Json(fetch_quote(state.client.as_ref(), pair).await?))
}
