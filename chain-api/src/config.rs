//! Server configuration.

use anyhow::Context;
use std::env;
use std::net::SocketAddr;
use std::ops::Add;

/// Server configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub rpc_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    ///
    /// Optional:
    /// - `PORT`: Port to bind to (default: 3000)
    /// - `WEB3_RPC_URL`: JSON-RPC endpoint of the node. When missing the server
    ///   still starts, but every chain-backed endpoint fails at call time.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let port = env::var("PORT").unwrap_or_else(|_| "3000".into());
        let bind_addr: SocketAddr = "0.0.0.0:"
            .to_string()
            .add(port.as_str())
            .parse()
            .with_context(|| format!("PORT is not a valid port: {port}"))?;
        let rpc_url = env::var("WEB3_RPC_URL").ok().filter(|s| !s.is_empty());

        Ok(Self { bind_addr, rpc_url })
    }

    /// Coarse provider label reported by `/network` on success.
    pub fn rpc_provider_label(&self) -> &'static str {
        match &self.rpc_url {
            Some(url) if url.contains("alchemy") => "Alchemy",
            _ => "Other",
        }
    }

    /// Label reported by `/network` when the node could not be queried.
    pub fn rpc_status_label(&self) -> &'static str {
        if self.rpc_url.is_some() {
            "Set but failing"
        } else {
            "Not Set"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(rpc_url: Option<&str>) -> Config {
        Config {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            rpc_url: rpc_url.map(String::from),
        }
    }

    #[test]
    fn provider_label() {
        assert_eq!(
            config(Some("https://eth-mainnet.g.alchemy.com/v2/key")).rpc_provider_label(),
            "Alchemy"
        );
        assert_eq!(
            config(Some("https://rpc.ankr.com/eth")).rpc_provider_label(),
            "Other"
        );
        assert_eq!(config(None).rpc_provider_label(), "Other");
    }

    #[test]
    fn status_label() {
        assert_eq!(
            config(Some("http://localhost:8545")).rpc_status_label(),
            "Set but failing"
        );
        assert_eq!(config(None).rpc_status_label(), "Not Set");
    }
}
