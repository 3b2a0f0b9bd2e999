//! JWT issuing and verification.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Email of the user the token was issued to.
    pub email_id: String,
    /// Issued at (unix seconds).
    pub iat: u64,
    /// Not valid before (unix seconds).
    pub nbf: u64,
    /// Expiration (unix seconds).
    pub exp: u64,
    /// Unique token ID.
    pub jti: String,
}

/// Token failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("missing token")]
    Missing,

    #[error("token expired")]
    Expired,

    #[error("token malformed")]
    Malformed,

    #[error("token invalid")]
    Invalid,

    #[error("token is not active yet")]
    NotActive,

    #[error("failed to sign token: {0}")]
    Encode(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotActive,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Malformed,
            _ => TokenError::Invalid,
        }
    }
}

/// Signs and verifies HS256 tokens with a shared secret.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_secs: u64,
}

impl TokenIssuer {
    /// Create an issuer from the shared secret and token lifetime.
    pub fn new(secret: &str, expiry_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_secs,
        }
    }

    /// Token lifetime in seconds.
    pub fn expiry_secs(&self) -> u64 {
        self.expiry_secs
    }

    /// Issue a token for `email` valid from now.
    pub fn issue(&self, email: &str) -> Result<String, TokenError> {
        self.issue_at(email, chrono::Utc::now().timestamp())
    }

    /// Issue a token for `email` as if it had been issued at `issued_at`.
    pub fn issue_at(&self, email: &str, issued_at: i64) -> Result<String, TokenError> {
        let iat = issued_at.max(0) as u64;
        let claims = TokenClaims {
            email_id: email.to_string(),
            iat,
            nbf: iat,
            exp: iat + self.expiry_secs,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify a token's signature and validity window and return its claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("expiry_secs", &self.expiry_secs)
            .finish_non_exhaustive()
    }
}
