//! Errors returned to HTTP clients.

use crate::price::PriceFetchError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before any chain read.
    #[error("Invalid Ethereum address")]
    InvalidAddress,

    #[error("{message}")]
    Network {
        message: String,
        rpc_url: &'static str,
    },

    #[error("Failed to fetch token information")]
    Token { details: String },

    #[error("Failed to fetch {pair} price")]
    Price {
        pair: &'static str,
        details: String,
        contract_address: String,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidAddress => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PriceFetchError> for ApiError {
    fn from(err: PriceFetchError) -> Self {
        ApiError::Price {
            pair: err.pair.label(),
            details: err.details(),
            contract_address: err.pair.contract().checksummed(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        let body = match self {
            ApiError::InvalidAddress => json!({ "error": message }),
            ApiError::Network { rpc_url, .. } => {
                error!(rpc_url, "network query failed: {message}");
                json!({ "error": message, "rpcUrl": rpc_url })
            }
            ApiError::Token { details } => {
                error!("{message}: {details}");
                json!({ "error": message, "details": details })
            }
            ApiError::Price {
                details,
                contract_address,
                ..
            } => {
                error!(contract = %contract_address, "{message}: {details}");
                json!({
                    "error": message,
                    "details": details,
                    "contractAddress": contract_address,
                })
            }
        };

        (status, Json(body)).into_response()
    }
}
