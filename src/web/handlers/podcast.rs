//! Podcast lookup handler.

use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use crate::web::dto::{PodcastDto, PodcastResponse, UrlRequest, ValidatedJson};
use crate::web::error::ApiResult;

/// POST /podcast - Fetch and parse a feed without storing it.
pub async fn get_podcast(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<UrlRequest>,
) -> ApiResult<Json<PodcastResponse>> {
    let feed = state.service.get_podcast_details(&req.url).await?;
    Ok(Json(PodcastResponse {
        podcast: PodcastDto::from(feed),
    }))
}
