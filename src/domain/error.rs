//! Domain error types.
//!
//! Malformed individual values never show up here: the cleaner absorbs them by
//! dropping rows. Only batch-level problems and the ambient I/O, config and
//! serialization failures are reported.

/// Top-level error type for pricewash.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("input is not tabular: {reason}")]
    NotTabular { reason: String },

    #[error("required column `{column}` is missing from the batch")]
    MissingColumn { column: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no input for symbol {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether the error rejects the batch itself rather than its surroundings.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            PipelineError::NotTabular { .. } | PipelineError::MissingColumn { .. }
        )
    }
}

impl From<&PipelineError> for std::process::ExitCode {
    fn from(err: &PipelineError) -> Self {
        let code: u8 = match err {
            PipelineError::Io(_) | PipelineError::NoData { .. } => 1,
            PipelineError::ConfigParse { .. } | PipelineError::ConfigInvalid { .. } => 2,
            PipelineError::NotTabular { .. } | PipelineError::MissingColumn { .. } => 3,
            PipelineError::Csv(_) | PipelineError::Json(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}
