//! User handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::web::dto::{EmailRequest, UserDto, UserResponse, ValidatedJson};
use crate::web::error::ApiResult;
use crate::web::middleware::AuthUser;

/// POST /user - Get the requesting user and their podcasts.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<EmailRequest>,
) -> ApiResult<Json<UserResponse>> {
    auth.ensure_user(&req.email_id)?;
    user_response(&state, &req.email_id).await
}

/// GET /user/:user - Same as `POST /user` with the email in the path.
pub async fn get_user_by_path(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(email): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    auth.ensure_user(&email)?;
    user_response(&state, &email).await
}

async fn user_response(state: &AppState, email: &str) -> ApiResult<Json<UserResponse>> {
    let user = state.service.get_user(email).await?;
    Ok(Json(UserResponse {
        user: UserDto::from(user),
    }))
}
