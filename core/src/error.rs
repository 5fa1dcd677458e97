use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Client-facing not-found (404-equivalent).
    #[error("Badge '{id}' not found")]
    BadgeNotFound { id: String },

    /// Validation failure — rejected before any write.
    #[error("Invalid engagement duration: {value}")]
    InvalidDuration { value: i64 },

    /// Validation failure — rejected before any write.
    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngageResult<T> = Result<T, EngageError>;
