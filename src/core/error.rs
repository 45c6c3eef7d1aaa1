/// Error types for the scoring pipeline
///
/// Schema problems abort the whole batch; degenerate batches (a single
/// wallet, all-equal scores) are not errors and are handled by the scaler.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Schema validation failed: {0}")]
    Schema(String),

    #[error("Required field missing: {0}")]
    MissingField(String),

    #[error("Required column missing from feature table: {0}")]
    MissingColumn(String),

    #[error("Invalid field value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("Cannot train on an empty feature table")]
    EmptyTrainingSet,

    #[error("Invalid score range: min {min} must be non-negative and below max {max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Model serialization failed: {0}")]
    ModelSerialization(#[from] bincode::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

impl ScoringError {
    /// True for every variant that signals a schema mismatch at a component boundary
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            ScoringError::Schema(_)
                | ScoringError::MissingField(_)
                | ScoringError::MissingColumn(_)
                | ScoringError::InvalidValue { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;
