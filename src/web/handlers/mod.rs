//! API handlers.

pub mod auth;
pub mod podcast;
pub mod subscription;
pub mod user;

pub use auth::*;
pub use podcast::*;
pub use subscription::*;
pub use user::*;

use crate::service::PodcastManageService;

/// Application state shared across handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// The service every handler delegates to.
    pub service: PodcastManageService,
}

impl AppState {
    /// Create a new application state.
    pub fn new(service: PodcastManageService) -> Self {
        Self { service }
    }
}
