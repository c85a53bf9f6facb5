//! Errors for port passage tracker
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error("CSV error")]
    CsvError(#[from] csv::Error),

    #[error("Row source channel closed")]
    ChannelError,

    #[error("Malformed input row: {reason}")]
    MalformedInputRow { reason: String },

    #[error("Invalid vessel name: {0:?}")]
    InvalidVesselName(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid search radius: {0}")]
    InvalidRadius(f64),

    #[error("Database connection error: {0}")]
    DatabaseConnectionError(String),

    #[error("Database migration error")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}

impl TrackerError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TrackerError::MalformedInputRow {
            reason: reason.into(),
        }
    }
}
