use chain_api::handlers::AppState;
use chain_api::{router, ChainClient, Config, RpcChainClient};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug ./chain-api
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chain_api=debug,tower_http=info"));
    fmt().with_env_filter(env_filter).with_target(false).init();

    let config = Arc::new(Config::from_env()?);
    let client = Arc::new(RpcChainClient::new(config.rpc_url.as_deref()));

    let state = AppState {
        client: client.clone(),
        config: config.clone(),
    };
    let app = router(state);

    info!("Blockchain API listening on http://{}", config.bind_addr);
    info!(
        "Web3 RPC: {}",
        config.rpc_url.as_deref().unwrap_or("NOT SET")
    );

    // Diagnostic only: the server runs whether or not the node answers.
    tokio::spawn(async move {
        match client.block_number().await {
            Ok(block) => info!("Web3 connected! Latest block: {block}"),
            Err(e) => error!("Web3 connection failed: {e:#}"),
        }
    });

    axum_server::bind(config.bind_addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
