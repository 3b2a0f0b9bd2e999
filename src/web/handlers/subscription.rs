//! Subscription handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use crate::web::dto::{
    EmailRequest, NewItemsResponse, PodcastDto, PodcastItemDto, PodcastResponse, StatusResponse,
    SubscriptionRequest, SubscriptionsResponse, ValidatedJson,
};
use crate::web::error::{ApiError, ApiResult};
use crate::web::middleware::AuthUser;

/// POST /subscribe - Subscribe the user to a feed, storing it if new.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<SubscriptionRequest>,
) -> ApiResult<Json<StatusResponse>> {
    auth.ensure_user(&req.email_id)?;
    state.service.subscribe(&req.email_id, &req.url).await?;
    Ok(Json(StatusResponse::ok()))
}

/// POST /unsubscribe - Remove a subscription.
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<SubscriptionRequest>,
) -> ApiResult<Json<StatusResponse>> {
    auth.ensure_user(&req.email_id)?;
    state.service.unsubscribe(&req.email_id, &req.url).await?;
    Ok(Json(StatusResponse::ok()))
}

/// POST /subscriptions - List the user's podcasts.
///
/// Errors from this endpoint are reported under `error` rather than `err`.
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<EmailRequest>,
) -> ApiResult<Json<SubscriptionsResponse>> {
    auth.ensure_user(&req.email_id).map_err(|e| e.under("error"))?;
    let podcasts = state
        .service
        .get_user_subscriptions(&req.email_id)
        .await
        .map_err(|e| ApiError::from(e).under("error"))?;
    Ok(Json(SubscriptionsResponse {
        subscriptions: podcasts.into_iter().map(PodcastDto::from).collect(),
    }))
}

/// POST /subscription - A subscribed podcast with its stored episodes.
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<SubscriptionRequest>,
) -> ApiResult<Json<PodcastResponse>> {
    auth.ensure_user(&req.email_id)?;
    let details = state
        .service
        .get_subscription_details(&req.email_id, &req.url)
        .await?;
    Ok(Json(PodcastResponse {
        podcast: PodcastDto::from(details),
    }))
}

/// POST /refresh - Pull new episodes of a subscribed podcast.
pub async fn refresh_subscription(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<SubscriptionRequest>,
) -> ApiResult<Json<NewItemsResponse>> {
    auth.ensure_user(&req.email_id)?;
    let items = state
        .service
        .refresh_subscription(&req.email_id, &req.url)
        .await?;
    Ok(Json(NewItemsResponse {
        new_items: items.into_iter().map(PodcastItemDto::from).collect(),
    }))
}
