mod config;
mod message;
mod poller;
mod ws;

use crate::{
    config::ServerConfig,
    message::{Payload, SnapshotCache},
    ws::ClientContext,
};
use liqmap_core::{Pipeline, PipelineConfig};
use liqmap_data::{BinanceKlineGateway, CoinglassGateway, GatewayConfig, MarketDataGateway};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    init_logging();

    let config = ServerConfig::from_env();
    info!(?config, "Starting liqmap heatmap server");

    let pipeline = match Pipeline::new(PipelineConfig::default()) {
        Ok(pipeline) => pipeline,
        Err(error) => {
            error!(%error, "invalid pipeline configuration");
            return;
        }
    };

    let gateway = init_gateway(&config);
    info!(gateway = gateway.name(), "market data gateway ready");

    let (tx, _rx) = broadcast::channel::<Payload>(config.buffer_size);
    let tx = Arc::new(tx);
    let cache = SnapshotCache::default();

    let listener = match TcpListener::bind(config.ws_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            error!(addr = %config.ws_addr, %error, "failed to bind WebSocket server");
            return;
        }
    };
    info!("WebSocket server listening on ws://{}", config.ws_addr);

    let context = ClientContext {
        tx: tx.clone(),
        cache: cache.clone(),
        symbols: config.symbols.clone().into(),
    };
    tokio::spawn(ws::serve(listener, context));

    tokio::select! {
        _ = poller::run(gateway, pipeline, config, tx, cache) => {
            warn!("poller stopped");
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                error!(%error, "failed to listen for shutdown signal");
            }
            info!("shutting down");
        }
    }
}

/// Coinglass serves both halves when a key is configured. Otherwise candles come from public
/// Binance klines and liquidation levels fall back.
fn init_gateway(config: &ServerConfig) -> Arc<dyn MarketDataGateway> {
    let client = reqwest::Client::new();

    match &config.coinglass_api_key {
        Some(api_key) => Arc::new(CoinglassGateway::with_client(
            client,
            GatewayConfig::coinglass().with_api_key(api_key),
        )),
        None => {
            warn!("COINGLASS_API_KEY not set, liquidation levels will be synthetic");
            Arc::new(BinanceKlineGateway::with_client(
                client,
                GatewayConfig::binance(),
            ))
        }
    }
}

/// Initialize logging
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
