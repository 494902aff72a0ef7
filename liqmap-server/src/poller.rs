use crate::{
    config::ServerConfig,
    message::{Payload, ServerMessage, SnapshotCache, SnapshotMessage},
};
use chrono::Utc;
use futures::future::join_all;
use liqmap_core::{Pipeline, PipelineError};
use liqmap_data::{MarketDataGateway, fetch_market_input};
use std::sync::Arc;
use tokio::{sync::broadcast, time::interval};
use tracing::{debug, error, info};

/// Fetch upstream data for `symbol` and run it through the pipeline.
pub async fn poll_symbol(
    gateway: &dyn MarketDataGateway,
    pipeline: &Pipeline,
    config: &ServerConfig,
    symbol: &str,
) -> Result<SnapshotMessage, PipelineError> {
    let input = fetch_market_input(
        gateway,
        &config.candle_request(symbol),
        &config.liquidation_request(symbol),
    )
    .await;

    let generated_at = Utc::now();
    let data = pipeline.run(&input, generated_at)?;

    Ok(SnapshotMessage {
        symbol: symbol.to_string(),
        generated_at,
        data,
    })
}

/// Serialise `snapshot`, cache it as the latest for its symbol and broadcast it.
///
/// Returns the number of clients the payload was handed to.
pub fn publish(
    snapshot: SnapshotMessage,
    tx: &broadcast::Sender<Payload>,
    cache: &SnapshotCache,
) -> Result<usize, serde_json::Error> {
    let symbol = snapshot.symbol.clone();
    let payload = ServerMessage::Snapshot(snapshot).to_payload()?;

    cache.insert(&symbol, payload.clone());

    // No subscribers is not an error, the cache still serves late joiners
    Ok(tx.send(payload).unwrap_or(0))
}

/// Poll every configured symbol once.
pub async fn poll_once(
    gateway: &dyn MarketDataGateway,
    pipeline: &Pipeline,
    config: &ServerConfig,
    tx: &broadcast::Sender<Payload>,
    cache: &SnapshotCache,
) {
    let results = join_all(
        config
            .symbols
            .iter()
            .map(|symbol| poll_symbol(gateway, pipeline, config, symbol)),
    )
    .await;

    for (symbol, result) in config.symbols.iter().zip(results) {
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(error) => {
                error!(%symbol, %error, "pipeline failed, skipping symbol");
                continue;
            }
        };

        let source = snapshot.data.source;
        let current_price = snapshot.data.current_price;
        let levels = snapshot.data.liquidity_levels.len();

        match publish(snapshot, tx, cache) {
            Ok(receivers) => info!(
                %symbol,
                %source,
                current_price,
                levels,
                receivers,
                "snapshot published"
            ),
            Err(error) => error!(%symbol, %error, "failed to serialise snapshot"),
        }
    }
}

/// Poll forever on the configured interval. The first tick fires immediately.
pub async fn run(
    gateway: Arc<dyn MarketDataGateway>,
    pipeline: Pipeline,
    config: ServerConfig,
    tx: Arc<broadcast::Sender<Payload>>,
    cache: SnapshotCache,
) {
    let mut timer = interval(config.poll_interval);

    loop {
        timer.tick().await;
        debug!(gateway = gateway.name(), symbols = ?config.symbols, "polling");
        poll_once(gateway.as_ref(), &pipeline, &config, &tx, &cache).await;
    }
}
