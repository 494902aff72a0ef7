use crate::{error::GatewayError, request::FetchRequest};
use async_trait::async_trait;
use liqmap_core::{Candle, LiquidationEvent, MarketInput};
use tracing::{debug, error, warn};

/// Upstream source of raw candles and liquidation history.
///
/// Implementations own their HTTP client and credentials. Every failure is reported as a
/// [`GatewayError`]; partial results are never returned.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    async fn fetch_ohlc(&self, request: &FetchRequest) -> Result<Vec<Candle>, GatewayError>;

    async fn fetch_liquidations(
        &self,
        request: &FetchRequest,
    ) -> Result<Vec<LiquidationEvent>, GatewayError>;
}

/// Fetch candles and liquidations concurrently, mapping any failure to an empty input so the
/// pipeline falls back for that half.
pub async fn fetch_market_input(
    gateway: &dyn MarketDataGateway,
    candle_request: &FetchRequest,
    liquidation_request: &FetchRequest,
) -> MarketInput {
    let (candle_result, liquidation_result) = futures::join!(
        gateway.fetch_ohlc(candle_request),
        gateway.fetch_liquidations(liquidation_request)
    );

    let candles = candle_result.unwrap_or_else(|error| {
        log_unavailable(gateway.name(), &candle_request.symbol, "OHLC", &error);
        Vec::new()
    });

    let liquidations = liquidation_result.unwrap_or_else(|error| {
        log_unavailable(
            gateway.name(),
            &liquidation_request.symbol,
            "liquidation history",
            &error,
        );
        Vec::new()
    });

    debug!(
        gateway = gateway.name(),
        candles = candles.len(),
        liquidations = liquidations.len(),
        "market input fetched"
    );

    MarketInput::new(candles, liquidations)
}

/// Capability gaps are expected every poll and logged quietly. Transient failures are worth a
/// warning, anything else (eg/ a rejected API key) needs operator attention.
fn log_unavailable(gateway: &str, symbol: &str, data: &str, error: &GatewayError) {
    if error.is_unsupported() {
        debug!(gateway, symbol, data, %error, "data unavailable from gateway");
    } else if error.is_transient() {
        warn!(gateway, symbol, data, %error, "data temporarily unavailable");
    } else {
        error!(gateway, symbol, data, %error, "data unavailable");
    }
}

/// Composes a candle source with a separate liquidation source.
///
/// Useful when the liquidation provider needs a key but candles can come from a public API.
#[derive(Debug)]
pub struct SplitGateway<C, L> {
    pub candles: C,
    pub liquidations: L,
}

impl<C, L> SplitGateway<C, L> {
    pub fn new(candles: C, liquidations: L) -> Self {
        Self {
            candles,
            liquidations,
        }
    }
}

#[async_trait]
impl<C, L> MarketDataGateway for SplitGateway<C, L>
where
    C: MarketDataGateway,
    L: MarketDataGateway,
{
    fn name(&self) -> &'static str {
        "split"
    }

    async fn fetch_ohlc(&self, request: &FetchRequest) -> Result<Vec<Candle>, GatewayError> {
        self.candles.fetch_ohlc(request).await
    }

    async fn fetch_liquidations(
        &self,
        request: &FetchRequest,
    ) -> Result<Vec<LiquidationEvent>, GatewayError> {
        self.liquidations.fetch_liquidations(request).await
    }
}
