//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for quantsim.
#[derive(Debug, thiserror::Error)]
pub enum QuantsimError {
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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no price data for {ticker}")]
    NoData { ticker: String },

    #[error("price series is empty")]
    EmptySeries,

    #[error("length mismatch: {prices} prices but {changes} position changes")]
    LengthMismatch { prices: usize, changes: usize },

    #[error("date mismatch at row {index}: price {price_date}, position change {change_date}")]
    DateMismatch {
        index: usize,
        price_date: NaiveDate,
        change_date: NaiveDate,
    },

    #[error("dates out of order at row {index}")]
    UnorderedDates { index: usize },

    #[error("initial capital must be positive, got {capital}")]
    InvalidCapital { capital: f64 },

    #[error("invalid price at row {index}: {price}")]
    InvalidPrice { index: usize, price: f64 },

    #[error("share count overflows on {date}")]
    PositionOverflow { date: NaiveDate },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl QuantsimError {
    /// True for the input errors `simulate` rejects.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            QuantsimError::EmptySeries
                | QuantsimError::LengthMismatch { .. }
                | QuantsimError::DateMismatch { .. }
                | QuantsimError::UnorderedDates { .. }
                | QuantsimError::InvalidCapital { .. }
                | QuantsimError::InvalidPrice { .. }
                | QuantsimError::PositionOverflow { .. }
        )
    }
}

impl From<&QuantsimError> for std::process::ExitCode {
    fn from(err: &QuantsimError) -> Self {
        let code: u8 = match err {
            QuantsimError::Io(_) => 1,
            QuantsimError::ConfigParse { .. }
            | QuantsimError::ConfigMissing { .. }
            | QuantsimError::ConfigInvalid { .. } => 2,
            QuantsimError::Data { .. } | QuantsimError::NoData { .. } => 3,
            QuantsimError::UnknownStrategy { .. } | QuantsimError::InvalidParameter { .. } => 4,
            QuantsimError::EmptySeries
            | QuantsimError::LengthMismatch { .. }
            | QuantsimError::DateMismatch { .. }
            | QuantsimError::UnorderedDates { .. }
            | QuantsimError::InvalidCapital { .. }
            | QuantsimError::InvalidPrice { .. }
            | QuantsimError::PositionOverflow { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
