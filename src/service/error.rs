//! Service-level error taxonomy.

use thiserror::Error;

/// Errors returned by [`PodcastManageService`](super::PodcastManageService).
///
/// Underlying causes are logged where they happen and not carried here.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError {
    #[error("DB Connection Failed")]
    DbConnection,

    #[error("Failed to create User")]
    UserCreate,

    #[error("User already exists")]
    UserExists,

    #[error("Failed to get user")]
    UserFetch,

    #[error("Failed to build podcast from given URL")]
    PodcastBuild,

    #[error("Failed to save user update to Database")]
    UserUpdate,

    #[error("Failed to save podcast update to Database")]
    PodcastUpdate,

    #[error("Failed to fetch subscriptions")]
    PodcastFetch,

    #[error("Invalid password provided")]
    InvalidPassword,

    #[error("Failed to issue token")]
    TokenIssue,
}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
