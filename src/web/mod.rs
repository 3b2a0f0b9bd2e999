//! HTTP API for podcastmg.
//!
//! JSON over `POST` for almost every operation, bearer-token authentication
//! for anything scoped to a user.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
