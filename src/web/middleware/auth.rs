//! JWT authentication middleware.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{TokenClaims, TokenError, TokenIssuer};
use crate::web::error::ApiError;

/// Extractor for authenticated users.
///
/// Reads a `Bearer` token from the `Authorization` header and verifies it
/// with the [`TokenIssuer`] placed in the request extensions by [`jwt_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub TokenClaims);

impl AuthUser {
    /// The email the token was issued for.
    pub fn email(&self) -> &str {
        &self.0.email_id
    }

    /// Reject the request unless the token belongs to `email`.
    pub fn ensure_user(&self, email: &str) -> Result<(), ApiError> {
        if self.0.email_id != email {
            tracing::warn!(
                token_user = %self.0.email_id,
                requested = email,
                "token does not match requested user"
            );
            return Err(ApiError::invalid_claim());
        }
        Ok(())
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = bearer_token(parts).ok_or(TokenError::Missing)?;

            let issuer = parts
                .extensions
                .get::<Arc<TokenIssuer>>()
                .ok_or_else(|| ApiError::internal("Token issuer not configured"))?;

            let claims = issuer.verify(token).map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                ApiError::from(e)
            })?;

            Ok(AuthUser(claims))
        })
    }
}

/// Middleware function to inject the token issuer into request extensions.
pub async fn jwt_auth(issuer: Arc<TokenIssuer>, mut request: Request<Body>, next: Next) -> Response {
    request.extensions_mut().insert(issuer);
    next.run(request).await
}
