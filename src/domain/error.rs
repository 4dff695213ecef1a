//! Domain error types.

/// Top-level error type for spitrader.
#[derive(Debug, thiserror::Error)]
pub enum SpitraderError {
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

    /// A second position was requested for a symbol that already holds one.
    /// Indicates a scheduling bug in the caller.
    #[error("position already open for {symbol}")]
    PositionAlreadyOpen { symbol: String },

    #[error("fetch from {source_name} failed: {reason}")]
    Fetch { source_name: String, reason: String },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("storage query error: {reason}")]
    StorageQuery { reason: String },

    #[error("malformed data: {reason}")]
    DataFormat { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SpitraderError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SpitraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&SpitraderError> for std::process::ExitCode {
    fn from(err: &SpitraderError) -> Self {
        let code: u8 = match err {
            SpitraderError::Io(_) => 1,
            SpitraderError::ConfigParse { .. }
            | SpitraderError::ConfigMissing { .. }
            | SpitraderError::ConfigInvalid { .. } => 2,
            SpitraderError::Storage { .. } | SpitraderError::StorageQuery { .. } => 3,
            SpitraderError::PositionAlreadyOpen { .. } => 4,
            SpitraderError::Fetch { .. } | SpitraderError::DataFormat { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_invalid_message_names_section_and_key() {
        let err = SpitraderError::invalid("engine", "capital", "capital must be positive");
        assert_eq!(
            err.to_string(),
            "invalid config value [engine] capital: capital must be positive"
        );
    }

    #[test]
    fn position_already_open_message() {
        let err = SpitraderError::PositionAlreadyOpen {
            symbol: "BTC".into(),
        };
        assert_eq!(err.to_string(), "position already open for BTC");
    }

    #[test]
    fn io_error_is_transparent() {
        let err: SpitraderError = std::io::Error::other("disk gone").into();
        assert_eq!(err.to_string(), "disk gone");
    }
}
