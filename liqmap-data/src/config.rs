use crate::error::GatewayError;
use std::time::Duration;
use url::Url;

/// Default Coinglass open API base URL
pub const COINGLASS_BASE_URL: &str = "https://open-api-v4.coinglass.com";

/// Default Binance USD-M futures REST base URL
pub const BINANCE_FUTURES_BASE_URL: &str = "https://fapi.binance.com";

/// HTTP gateway configuration
#[derive(Clone)]
pub struct GatewayConfig {
    /// REST base URL, endpoint paths are joined onto it
    pub base_url: String,
    /// Credential sent with every request, if the upstream requires one
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GatewayConfig {
    /// Create a new configuration with custom base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Coinglass defaults
    pub fn coinglass() -> Self {
        Self::new(COINGLASS_BASE_URL)
    }

    /// Binance futures defaults
    pub fn binance() -> Self {
        Self::new(BINANCE_FUTURES_BASE_URL)
    }

    /// Set API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve `path` against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        let mut base = Url::parse(&self.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }
}
