use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `liqmap-data`.
///
/// None of these cross into the analytics core: callers treat every variant as "data
/// unavailable" and let the pipeline fall back.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP request timed out")]
    Timeout,

    #[error("HTTP error status: {0}")]
    Status(u16),

    #[error("API error (code {code}): {msg}")]
    Api { code: String, msg: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("response contained no usable rows")]
    Empty,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{gateway} does not provide {operation}")]
    Unsupported { gateway: String, operation: String },
}

impl GatewayError {
    /// Determine if retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Http(_) | GatewayError::Timeout | GatewayError::Empty => true,
            GatewayError::Status(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Determine if the gateway can never serve this request.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, GatewayError::Unsupported { .. })
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else if value.is_decode() {
            Self::Decode(value.to_string())
        } else if let Some(status) = value.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Http(value.to_string())
        }
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(value: url::ParseError) -> Self {
        Self::InvalidRequest(value.to_string())
    }
}
