use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `liqmap-core`.
///
/// Every variant is terminal for the pipeline run that produced it: no partially built
/// snapshot is ever returned alongside an error.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("current price is not a positive finite number: {0}")]
    InvalidPrice(f64),

    #[error("heatmap grid exceeds {max} cells ({rows} rows x {cols} columns)")]
    GridTooLarge { rows: usize, cols: usize, max: usize },
}

impl PipelineError {
    /// Determine if the error is caused by caller supplied configuration rather than data.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidConfig(_) | PipelineError::GridTooLarge { .. }
        )
    }
}
