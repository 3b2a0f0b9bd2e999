//! Registration and login handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use crate::web::dto::{CredentialsRequest, StatusResponse, TokenResponse, ValidatedJson};
use crate::web::error::ApiResult;

/// POST /register - Create a user.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CredentialsRequest>,
) -> ApiResult<Json<StatusResponse>> {
    state
        .service
        .create_user(&req.email_id, &req.password)
        .await?;
    Ok(Json(StatusResponse::ok()))
}

/// POST /login - Exchange credentials for an access token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CredentialsRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token_string = state.service.get_token(&req.email_id, &req.password).await?;
    Ok(Json(TokenResponse { token_string }))
}
