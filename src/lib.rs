//! podcastmg - podcast subscription management backend
//!
//! Users register, log in for a bearer token, and subscribe to podcast feeds.
//! Feeds are fetched and normalized on demand, stored in SQLite, and kept
//! up to date by a background updater.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod podcast;
pub mod service;
pub mod web;

pub use auth::{
    hash_password, validate_password, verify_password, PasswordError, TokenClaims, TokenError,
    TokenIssuer, MAX_PASSWORD_LENGTH,
};
pub use config::Config;
pub use db::{Database, NewUser, SubscriptionRepository, User, UserRepository};
pub use error::{PodcastMgError, Result};
pub use podcast::{
    start_podcast_updater, FeedFetcher, NewPodcast, NewPodcastItem, Podcast, PodcastFeed,
    PodcastItem, PodcastUpdater,
};
pub use service::{PodcastManageService, ServiceError, ServiceResult};
pub use web::WebServer;
