use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Tabular store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Write to tabular store failed: {0}")]
    StoreWrite(String),

    #[error("Store was opened read-only; writes are not permitted")]
    ReadOnly,

    #[error("Text recognition failed: {0}")]
    Recognition(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TrackerError {
    /// True for failures that mean the external store could not be reached or read,
    /// as opposed to a store that is reachable but holds no sessions.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
