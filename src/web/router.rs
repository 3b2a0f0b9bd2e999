//! Router configuration for Web API.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    get_podcast, get_subscription, get_user, get_user_by_path, list_subscriptions, login,
    refresh_subscription, register, subscribe, unsubscribe, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth};

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let issuer = app_state.service.tokens();

    // No authentication required
    let public_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/podcast", post(get_podcast));

    // Handlers take `AuthUser`
    let protected_routes = Router::new()
        .route("/user", post(get_user))
        .route("/user/:user", get(get_user_by_path))
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
        .route("/subscriptions", post(list_subscriptions))
        .route("/subscription", post(get_subscription))
        .route("/refresh", post(refresh_subscription));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(CompressionLayer::new())
                .layer(middleware::from_fn(move |req, next| {
                    jwt_auth(issuer.clone(), req, next)
                })),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
