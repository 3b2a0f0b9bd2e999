//! Shared helpers for the HTTP API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use podcastmg::config::FeedConfig;
use podcastmg::web::handlers::AppState;
use podcastmg::web::router::create_router;
use podcastmg::{Database, FeedFetcher, PodcastManageService, TokenIssuer};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Signing secret used by every test server.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// A running API with its service and a mock feed host.
pub struct TestApp {
    pub server: TestServer,
    pub service: PodcastManageService,
    pub feeds: MockServer,
}

impl TestApp {
    /// URL of a feed served by the mock host.
    pub fn feed_url(&self, route: &str) -> String {
        format!("{}{}", self.feeds.uri(), route)
    }
}

/// Create a test server with an in-memory database.
pub async fn create_test_app() -> TestApp {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    // The mock feed host listens on loopback.
    let fetcher = FeedFetcher::new(&FeedConfig {
        allow_private_hosts: true,
        ..FeedConfig::default()
    })
    .expect("Failed to create feed fetcher");

    let tokens = Arc::new(TokenIssuer::new(TEST_SECRET, 24 * 60 * 60));
    let service = PodcastManageService::new(db, fetcher, tokens);

    let router = create_router(Arc::new(AppState::new(service.clone())), &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        service,
        feeds: MockServer::start().await,
    }
}

/// An RSS document whose items carry an enclosure named after the title.
pub fn rss(show: &str, titles: &[&str]) -> String {
    let items: String = titles
        .iter()
        .map(|t| {
            format!(
                "<item><title>{t}</title><guid>{t}</guid>\
                 <description>About {t}</description>\
                 <enclosure url=\"https://cdn.example.com/{t}.mp3\" length=\"1234\" type=\"audio/mpeg\"/>\
                 </item>"
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <rss version=\"2.0\"><channel>\
         <title>{show}</title><link>https://example.com</link>\
         <description>All about {show}</description>{items}\
         </channel></rss>"
    )
}

/// Serve `rss(show, titles)` at `route`, replacing whatever was mounted before.
pub async fn serve_feed(feeds: &MockServer, route: &str, show: &str, titles: &[&str]) {
    feeds.reset().await;
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(rss(show, titles)),
        )
        .mount(feeds)
        .await;
}

/// Register a user and return the response body.
pub async fn register(server: &TestServer, email: &str, password: &str) -> Value {
    server
        .post("/register")
        .json(&json!({ "email_id": email, "password": password }))
        .await
        .json::<Value>()
}

/// Log in and return the access token.
pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let body = server
        .post("/login")
        .json(&json!({ "email_id": email, "password": password }))
        .await
        .json::<Value>();
    body["token_string"]
        .as_str()
        .expect("login response has no token")
        .to_string()
}

/// Register and log in, returning the access token.
pub async fn register_and_login(server: &TestServer, email: &str, password: &str) -> String {
    register(server, email, password).await;
    login(server, email, password).await
}

/// `Authorization` header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

