//! Domain error types.
//!
//! Only infrastructure failures live here. Business-rule outcomes — a
//! degraded report, an `Invalid` sizing result, a fail-open regime default —
//! are data, not errors.

/// Top-level error type for tradelog.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("invalid row {row} in {file}: {reason}")]
    ImportRow {
        file: String,
        row: usize,
        reason: String,
    },

    #[error("no price data for any ticker in the universe")]
    NoPriceData,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&JournalError> for std::process::ExitCode {
    fn from(err: &JournalError) -> Self {
        let code: u8 = match err {
            JournalError::Io(_) => 1,
            JournalError::ConfigParse { .. }
            | JournalError::ConfigMissing { .. }
            | JournalError::ConfigInvalid { .. } => 2,
            JournalError::Database { .. } | JournalError::DatabaseQuery { .. } => 3,
            JournalError::ImportRow { .. } | JournalError::NoPriceData => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let err = JournalError::ConfigMissing {
            section: "sqlite".into(),
            key: "path".into(),
        };
        assert_eq!(err.to_string(), "missing config key [sqlite] path");

        let err = JournalError::ImportRow {
            file: "trades.csv".into(),
            row: 7,
            reason: "invalid pnl".into(),
        };
        assert_eq!(err.to_string(), "invalid row 7 in trades.csv: invalid pnl");
    }

    #[test]
    fn no_price_data_maps_to_data_exit_code() {
        let err = JournalError::NoPriceData;
        let code: std::process::ExitCode = (&err).into();
        assert_eq!(format!("{:?}", code), format!("{:?}", std::process::ExitCode::from(5)));
    }
}
