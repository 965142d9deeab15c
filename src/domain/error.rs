//! Domain error types.

/// Top-level error type for barchart.
#[derive(Debug, thiserror::Error)]
pub enum BarchartError {
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

    #[error("invalid strategy: {reason}")]
    StrategyInvalid { reason: String },

    #[error("bar {bar_id} has no reading for indicator {reading}")]
    MissingReading { bar_id: u64, reading: String },

    #[error("unknown average group: {0}")]
    UnknownAverage(String),

    #[error("zero open price on trade opened at {opened}")]
    ZeroOpenPrice { opened: String },

    #[error("price ids must be strictly increasing: {previous} followed by {next}")]
    UnorderedPrices { previous: u64, next: u64 },

    #[error("price timestamps must be strictly increasing: bar {id} at {timestamp} does not follow bar {previous}")]
    UnorderedTimestamps {
        previous: u64,
        id: u64,
        timestamp: String,
    },

    #[error("no price data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&BarchartError> for std::process::ExitCode {
    fn from(err: &BarchartError) -> Self {
        let code: u8 = match err {
            BarchartError::Io(_) => 1,
            BarchartError::ConfigParse { .. }
            | BarchartError::ConfigMissing { .. }
            | BarchartError::ConfigInvalid { .. }
            | BarchartError::UnknownAverage(_) => 2,
            BarchartError::Database { .. } | BarchartError::DatabaseQuery { .. } => 3,
            BarchartError::StrategyInvalid { .. } | BarchartError::MissingReading { .. } => 4,
            BarchartError::NoData { .. }
            | BarchartError::ZeroOpenPrice { .. }
            | BarchartError::UnorderedPrices { .. }
            | BarchartError::UnorderedTimestamps { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
