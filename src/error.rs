//! Error types for podcastmg.

use thiserror::Error;

/// Common error type for podcastmg.
#[derive(Error, Debug)]
pub enum PodcastMgError {
    /// Database error.
    ///
    /// Generic query/execution failure reported by the store.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// A unique constraint was violated (duplicate email, duplicate feed URL).
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Feed could not be fetched or parsed.
    #[error("feed error: {0}")]
    Feed(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for PodcastMgError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_) => PodcastMgError::DatabaseConnection(e.to_string()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PodcastMgError::AlreadyExists("record".to_string())
            }
            _ => PodcastMgError::Database(e.to_string()),
        }
    }
}

impl PodcastMgError {
    /// Whether the error means the store could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, PodcastMgError::DatabaseConnection(_))
    }
}

/// Result type alias for podcastmg operations.
pub type Result<T> = std::result::Result<T, PodcastMgError>;
