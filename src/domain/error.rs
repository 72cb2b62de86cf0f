//! Domain error types.

/// Top-level error type for switchback.
#[derive(Debug, thiserror::Error)]
pub enum SwitchbackError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("malformed price data in {source_name}: {reason}")]
    DataFormat { source_name: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("insufficient data: no bars for {symbol}")]
    DataUnavailable { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SwitchbackError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SwitchbackError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        SwitchbackError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    /// Process exit status reported by the CLI for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            SwitchbackError::Io(_) => 1,
            SwitchbackError::ConfigParse { .. }
            | SwitchbackError::ConfigMissing { .. }
            | SwitchbackError::ConfigInvalid { .. } => 2,
            SwitchbackError::Database { .. }
            | SwitchbackError::DatabaseQuery { .. }
            | SwitchbackError::DataFormat { .. } => 3,
            SwitchbackError::DataUnavailable { .. } => 5,
        }
    }
}

impl From<&SwitchbackError> for std::process::ExitCode {
    fn from(err: &SwitchbackError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
