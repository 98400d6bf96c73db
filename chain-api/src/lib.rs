//! Read-only HTTP API over an Ethereum JSON-RPC node.
//!
//! Serves ERC-20 token metadata, Chainlink ETH/USD and BTC/USD prices and a
//! network summary. Every request is answered from fresh chain reads; nothing
//! is cached or persisted.
//!
//! ## Endpoints
//!
//! ```text
//! GET /                 service banner
//! GET /network          chain id, head block, gas price, contract liveness
//! GET /token/{address}  ERC-20 name, symbol, decimals, total supply
//! GET /price/eth        ETH/USD (latestAnswer, falling back to latestRoundData)
//! GET /price/btc        BTC/USD (latestRoundData)
//! ```

pub mod chain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod handlers;
pub mod network;
pub mod price;
pub mod token;

use axum::http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderName, Method};
use axum::routing::get;
use axum::Router;
use handlers::AppState;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use chain::{ChainClient, RpcChainClient};
pub use config::Config;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    // Open to any origin
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            ORIGIN,
            HeaderName::from_static("x-requested-with"),
            CONTENT_TYPE,
            ACCEPT,
        ])
        .allow_origin(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/network", get(handlers::network))
        .route("/token/{address}", get(handlers::token))
        .route("/price/eth", get(handlers::price_eth))
        .route("/price/btc", get(handlers::price_btc))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
