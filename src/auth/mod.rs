//! Authentication: password hashing and access tokens.

mod password;
mod token;

pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
};
pub use token::{TokenClaims, TokenError, TokenIssuer};
