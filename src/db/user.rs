//! User model for podcastmg.

/// A registered user.
///
/// The password hash never leaves the server: this type is not `Serialize`,
/// and the web layer builds its own response DTOs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Email address (unique login identifier).
    pub email: String,
    /// Password hash (Argon2id PHC string).
    pub password: String,
    /// Administrator flag.
    pub is_admin: bool,
    /// Account creation timestamp.
    pub created_at: String,
    /// Last modification timestamp.
    pub updated_at: String,
    /// Soft delete timestamp.
    pub deleted_at: Option<String>,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email address.
    pub email: String,
    /// Password hash (pre-hashed with Argon2id).
    pub password: String,
    /// Administrator flag (defaults to false).
    pub is_admin: bool,
}

impl NewUser {
    /// Create a new user from an email and an already hashed password.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password_hash.into(),
            is_admin: false,
        }
    }
}
