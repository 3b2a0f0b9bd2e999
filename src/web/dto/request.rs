//! Request DTOs for Web API.
//!
//! Missing fields decode as empty strings; the service decides whether an
//! empty value is acceptable.

use serde::Deserialize;
use validator::Validate;

use super::validation::no_control_chars;

/// Longest accepted email address.
pub const MAX_EMAIL_LENGTH: u64 = 254;

/// Longest accepted feed URL.
pub const MAX_URL_LENGTH: u64 = 2048;

/// Credentials, used by `/register` and `/login`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CredentialsRequest {
    /// Email address.
    #[validate(
        length(max = 254, message = "Email is too long"),
        custom(function = "no_control_chars")
    )]
    pub email_id: String,
    /// Plain text password.
    #[validate(length(max = 128, message = "Password is too long"))]
    pub password: String,
}

/// A request naming a user.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct EmailRequest {
    #[validate(
        length(max = 254, message = "Email is too long"),
        custom(function = "no_control_chars")
    )]
    pub email_id: String,
}

/// A request naming a feed.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UrlRequest {
    #[validate(
        length(max = 2048, message = "URL is too long"),
        custom(function = "no_control_chars")
    )]
    pub url: String,
}

/// A request naming a user and a feed.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SubscriptionRequest {
    #[validate(
        length(max = 254, message = "Email is too long"),
        custom(function = "no_control_chars")
    )]
    pub email_id: String,
    #[validate(
        length(max = 2048, message = "URL is too long"),
        custom(function = "no_control_chars")
    )]
    pub url: String,
}
