//! Podcast management service.
//!
//! Wraps the repositories, the feed fetcher and the token issuer behind the
//! operations exposed over HTTP. Every operation is logged with its method,
//! user, feed URL, error and elapsed time.

mod error;

pub use error::{ServiceError, ServiceResult};

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::auth::{hash_password, verify_password, TokenIssuer};
use crate::config::Config;
use crate::db::{Database, NewUser, SubscriptionRepository, User, UserRepository};
use crate::podcast::{
    new_items, normalize_feed, FeedFetcher, NewPodcastItem, Podcast, PodcastFeed,
    PodcastItemRepository, PodcastRepository, PodcastWithItems,
};
use crate::PodcastMgError;

/// A user together with the podcasts they are subscribed to.
#[derive(Debug, Clone)]
pub struct UserWithPodcasts {
    pub user: User,
    pub podcasts: Vec<Podcast>,
}

/// Log a finished operation.
fn log_call<T>(method: &str, user: &str, url: &str, started: Instant, result: &ServiceResult<T>) {
    let took_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(_) => info!(method, user, url, took_ms, "service call"),
        Err(e) => warn!(method, user, url, took_ms, err = %e, "service call failed"),
    }
}

async fn observe<T, F>(method: &str, user: &str, url: &str, call: F) -> ServiceResult<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    let started = Instant::now();
    let result = call.await;
    log_call(method, user, url, started, &result);
    result
}

/// Log the underlying cause and map it to `fallback`, unless the store was unreachable.
fn store_error(fallback: ServiceError) -> impl FnOnce(PodcastMgError) -> ServiceError {
    move |e| {
        error!(error = %e, "store operation failed");
        if e.is_connection() {
            ServiceError::DbConnection
        } else {
            fallback
        }
    }
}

/// The podcast subscription management service.
#[derive(Clone)]
pub struct PodcastManageService {
    db: Database,
    fetcher: FeedFetcher,
    tokens: Arc<TokenIssuer>,
}

impl PodcastManageService {
    /// Create a service from its parts.
    pub fn new(db: Database, fetcher: FeedFetcher, tokens: Arc<TokenIssuer>) -> Self {
        Self {
            db,
            fetcher,
            tokens,
        }
    }

    /// Create a service from configuration over an opened database.
    pub fn from_config(db: Database, config: &Config) -> crate::Result<Self> {
        let fetcher = FeedFetcher::new(&config.feed)?;
        let tokens = Arc::new(TokenIssuer::new(
            &config.auth.jwt_secret,
            config.auth.token_expiry_secs,
        ));
        Ok(Self::new(db, fetcher, tokens))
    }

    /// The database this service runs against.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// The token issuer used for login and request authentication.
    pub fn tokens(&self) -> Arc<TokenIssuer> {
        Arc::clone(&self.tokens)
    }

    /// Register a new user.
    pub async fn create_user(&self, email: &str, password: &str) -> ServiceResult<()> {
        observe("CreateUser", email, "", async {
            if email.trim().is_empty() || password.is_empty() {
                warn!("email or password cannot be empty for user");
                return Err(ServiceError::UserCreate);
            }

            let users = UserRepository::new(self.db.pool());
            if users
                .email_exists(email)
                .await
                .map_err(store_error(ServiceError::UserCreate))?
            {
                return Err(ServiceError::UserExists);
            }

            let password = password.to_string();
            let hash = tokio::task::spawn_blocking(move || hash_password(&password))
                .await
                .map_err(|e| {
                    error!(error = %e, "password hashing task failed");
                    ServiceError::UserCreate
                })?
                .map_err(|e| {
                    warn!(error = %e, "password rejected");
                    ServiceError::UserCreate
                })?;

            // A concurrent registration can still win the race.
            users
                .create(&NewUser::new(email, hash))
                .await
                .map_err(|e| match e {
                    PodcastMgError::AlreadyExists(_) => ServiceError::UserExists,
                    other => store_error(ServiceError::UserCreate)(other),
                })?;
            Ok(())
        })
        .await
    }

    /// Get a user and the podcasts they are subscribed to (without items).
    pub async fn get_user(&self, email: &str) -> ServiceResult<UserWithPodcasts> {
        observe("GetUser", email, "", async {
            let user = self.find_user(email).await?;
            let podcasts = SubscriptionRepository::new(self.db.pool())
                .list_podcasts_for_user(user.id)
                .await
                .map_err(store_error(ServiceError::UserFetch))?;
            Ok(UserWithPodcasts { user, podcasts })
        })
        .await
    }

    /// Fetch and normalize the feed at `url` without storing it.
    pub async fn get_podcast_details(&self, url: &str) -> ServiceResult<PodcastFeed> {
        observe("GetPodcastDetails", "", url, self.build_podcast(url)).await
    }

    /// Subscribe a user to the podcast at `url`, storing the podcast first if unknown.
    ///
    /// Subscribing twice is a no-op.
    pub async fn subscribe(&self, email: &str, url: &str) -> ServiceResult<()> {
        observe("Subscribe", email, url, async {
            let user = self.find_user(email).await?;
            let podcast = self.podcast_for_url(url).await?;

            let added = SubscriptionRepository::new(self.db.pool())
                .subscribe(user.id, podcast.id)
                .await
                .map_err(store_error(ServiceError::UserUpdate))?;
            if !added {
                info!(user = email, url, "already subscribed");
            }
            Ok(())
        })
        .await
    }

    /// Remove a user's subscription to `url`. Unknown podcasts are a no-op.
    pub async fn unsubscribe(&self, email: &str, url: &str) -> ServiceResult<()> {
        observe("Unsubscribe", email, url, async {
            let user = self.find_user(email).await?;
            let podcast = PodcastRepository::new(self.db.pool())
                .get_by_url(url)
                .await
                .map_err(store_error(ServiceError::UserUpdate))?;

            if let Some(podcast) = podcast {
                SubscriptionRepository::new(self.db.pool())
                    .unsubscribe(user.id, podcast.id)
                    .await
                    .map_err(store_error(ServiceError::UserUpdate))?;
            }
            Ok(())
        })
        .await
    }

    /// List the podcasts a user is subscribed to.
    pub async fn get_user_subscriptions(&self, email: &str) -> ServiceResult<Vec<Podcast>> {
        observe("GetUserSubscriptions", email, "", async {
            let user = self.find_user(email).await?;
            SubscriptionRepository::new(self.db.pool())
                .list_podcasts_for_user(user.id)
                .await
                .map_err(store_error(ServiceError::PodcastFetch))
        })
        .await
    }

    /// Get a subscribed podcast with its stored items.
    ///
    /// Fails with [`ServiceError::PodcastFetch`] if the user is not subscribed.
    pub async fn get_subscription_details(
        &self,
        email: &str,
        url: &str,
    ) -> ServiceResult<PodcastWithItems> {
        observe("GetSubscriptionDetails", email, url, async {
            let podcast = self.subscribed_podcast(email, url).await?;
            PodcastRepository::new(self.db.pool())
                .get_with_items(podcast.id)
                .await
                .map_err(store_error(ServiceError::PodcastFetch))?
                .ok_or(ServiceError::PodcastFetch)
        })
        .await
    }

    /// Verify credentials and issue an access token.
    pub async fn get_token(&self, email: &str, password: &str) -> ServiceResult<String> {
        observe("GetToken", email, "", async {
            let user = self.find_user(email).await?;

            let password = password.to_string();
            let hash = user.password.clone();
            tokio::task::spawn_blocking(move || verify_password(&password, &hash))
                .await
                .map_err(|e| {
                    error!(error = %e, "password verification task failed");
                    ServiceError::InvalidPassword
                })?
                .map_err(|_| ServiceError::InvalidPassword)?;

            self.tokens.issue(&user.email).map_err(|e| {
                error!(error = %e, "token signing failed");
                ServiceError::TokenIssue
            })
        })
        .await
    }

    /// Fetch the feed at `url` and return the episodes missing from `old`.
    ///
    /// See [`new_items`] for the scan order.
    pub async fn get_new_items<O>(&self, url: &str, old: &[O]) -> ServiceResult<Vec<NewPodcastItem>>
    where
        O: crate::podcast::EpisodeKey + Sync,
    {
        observe("GetNewItems", "", url, async {
            let feed = self.build_podcast(url).await?;
            Ok(new_items(old, &feed.items))
        })
        .await
    }

    /// Bring a subscribed podcast up to date and return the new episodes.
    ///
    /// New episodes are stored in feed order; the returned list is newest first.
    pub async fn refresh_subscription(
        &self,
        email: &str,
        url: &str,
    ) -> ServiceResult<Vec<NewPodcastItem>> {
        observe("RefreshSubscription", email, url, async {
            let podcast = self.subscribed_podcast(email, url).await?;
            self.refresh(&podcast).await
        })
        .await
    }

    /// Bring a stored podcast up to date. Returns the number of new episodes.
    pub async fn refresh_podcast(&self, podcast: &Podcast) -> ServiceResult<usize> {
        observe("RefreshPodcast", "", &podcast.url, async {
            self.refresh(podcast).await.map(|items| items.len())
        })
        .await
    }

    /// Soft delete a user.
    pub async fn delete_user(&self, email: &str) -> ServiceResult<()> {
        observe("DeleteUser", email, "", async {
            let user = self.find_user(email).await?;
            UserRepository::new(self.db.pool())
                .soft_delete(user.id)
                .await
                .map_err(store_error(ServiceError::UserUpdate))?;
            Ok(())
        })
        .await
    }

    async fn find_user(&self, email: &str) -> ServiceResult<User> {
        UserRepository::new(self.db.pool())
            .get_by_email(email)
            .await
            .map_err(store_error(ServiceError::UserFetch))?
            .ok_or_else(|| {
                warn!(user = email, "user does not exist");
                ServiceError::UserFetch
            })
    }

    async fn subscribed_podcast(&self, email: &str, url: &str) -> ServiceResult<Podcast> {
        let user = UserRepository::new(self.db.pool())
            .get_by_email(email)
            .await
            .map_err(store_error(ServiceError::PodcastFetch))?
            .ok_or(ServiceError::PodcastFetch)?;

        SubscriptionRepository::new(self.db.pool())
            .get_subscribed_podcast(user.id, url)
            .await
            .map_err(store_error(ServiceError::PodcastFetch))?
            .ok_or_else(|| {
                warn!(user = email, url, "no such subscription");
                ServiceError::PodcastFetch
            })
    }

    async fn build_podcast(&self, url: &str) -> ServiceResult<PodcastFeed> {
        let feed = self.fetcher.fetch(url).await.map_err(|e| {
            warn!(url, error = %e, "feed fetch failed");
            ServiceError::PodcastBuild
        })?;
        Ok(normalize_feed(url, feed))
    }

    /// Look up a podcast by URL, fetching and storing it with its items if unknown.
    async fn podcast_for_url(&self, url: &str) -> ServiceResult<Podcast> {
        let repo = PodcastRepository::new(self.db.pool());
        if let Some(podcast) = repo
            .get_by_url(url)
            .await
            .map_err(store_error(ServiceError::UserUpdate))?
        {
            return Ok(podcast);
        }

        let feed = self.build_podcast(url).await?;
        match repo.create_with_items(&feed.podcast, &feed.items).await {
            Ok(podcast) => Ok(podcast),
            // Another request stored the same feed first.
            Err(PodcastMgError::AlreadyExists(_)) => repo
                .get_by_url(url)
                .await
                .map_err(store_error(ServiceError::UserUpdate))?
                .ok_or(ServiceError::UserUpdate),
            Err(e) => Err(store_error(ServiceError::UserUpdate)(e)),
        }
    }

    async fn refresh(&self, podcast: &Podcast) -> ServiceResult<Vec<NewPodcastItem>> {
        let items = PodcastItemRepository::new(self.db.pool());
        let stored = items
            .list_by_podcast(podcast.id)
            .await
            .map_err(store_error(ServiceError::PodcastFetch))?;

        let feed = self.build_podcast(&podcast.url).await?;
        let found = new_items(&stored, &feed.items);

        PodcastRepository::new(self.db.pool())
            .update_metadata(podcast.id, &feed.podcast)
            .await
            .map_err(store_error(ServiceError::PodcastUpdate))?;

        if found.is_empty() {
            return Ok(found);
        }

        // A concurrent refresh may have stored some of these already.
        let in_feed_order: Vec<NewPodcastItem> = found.into_iter().rev().collect();
        let mut stored_now = items
            .append(podcast.id, &in_feed_order)
            .await
            .map_err(store_error(ServiceError::PodcastUpdate))?;
        stored_now.reverse();
        if !stored_now.is_empty() {
            info!(url = %podcast.url, count = stored_now.len(), "stored new episodes");
        }

        Ok(stored_now)
    }
}

impl std::fmt::Debug for PodcastManageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodcastManageService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SECRET: &str = "test-secret";

    fn rss(titles: &[&str]) -> String {
        let items: String = titles
            .iter()
            .map(|t| {
                format!(
                    "<item><title>{t}</title><guid>{t}</guid>\
                     <enclosure url=\"https://cdn.example.com/{t}.mp3\" length=\"100\" type=\"audio/mpeg\"/>\
                     </item>"
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel>\
             <title>Test Show</title><description>About things</description>{items}\
             </channel></rss>"
        )
    }

    async fn serve_feed(server: &MockServer, titles: &[&str]) {
        server.reset().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/rss+xml")
                    .set_body_string(rss(titles)),
            )
            .mount(server)
            .await;
    }

    async fn setup() -> (PodcastManageService, MockServer, String) {
        let db = Database::open_in_memory().await.unwrap();
        let feed_config = FeedConfig {
            allow_private_hosts: true,
            ..FeedConfig::default()
        };
        let fetcher = FeedFetcher::new(&feed_config).unwrap();
        let tokens = Arc::new(TokenIssuer::new(SECRET, 3600));
        let service = PodcastManageService::new(db, fetcher, tokens);

        let server = MockServer::start().await;
        serve_feed(&server, &["ep1", "ep2"]).await;
        let url = format!("{}/feed.xml", server.uri());

        (service, server, url)
    }

    fn titles<T: crate::podcast::EpisodeKey>(items: &[T]) -> Vec<String> {
        items.iter().map(|i| i.title().to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_user_rejects_empty_fields() {
        let (service, _server, _url) = setup().await;

        assert_eq!(
            service.create_user("", "password").await,
            Err(ServiceError::UserCreate)
        );
        assert_eq!(
            service.create_user("alice@example.com", "").await,
            Err(ServiceError::UserCreate)
        );
    }

    #[tokio::test]
    async fn test_create_user_duplicate() {
        let (service, _server, _url) = setup().await;

        service.create_user("alice@example.com", "pw").await.unwrap();
        assert_eq!(
            service.create_user("alice@example.com", "pw").await,
            Err(ServiceError::UserExists)
        );
    }

    #[tokio::test]
    async fn test_create_user_email_of_deleted_account_is_taken() {
        let (service, _server, _url) = setup().await;
        service.create_user("alice@example.com", "pw").await.unwrap();
        service.delete_user("alice@example.com").await.unwrap();

        assert_eq!(
            service.create_user("alice@example.com", "pw").await,
            Err(ServiceError::UserExists)
        );
    }

    #[tokio::test]
    async fn test_get_token() {
        let (service, _server, _url) = setup().await;
        service.create_user("alice@example.com", "secret-pw").await.unwrap();

        let token = service.get_token("alice@example.com", "secret-pw").await.unwrap();
        let claims = service.tokens().verify(&token).unwrap();
        assert_eq!(claims.email_id, "alice@example.com");

        assert_eq!(
            service.get_token("alice@example.com", "wrong").await,
            Err(ServiceError::InvalidPassword)
        );
        assert_eq!(
            service.get_token("nobody@example.com", "secret-pw").await,
            Err(ServiceError::UserFetch)
        );
    }

    #[tokio::test]
    async fn test_get_podcast_details_is_not_stored() {
        let (service, _server, url) = setup().await;

        let feed = service.get_podcast_details(&url).await.unwrap();
        assert_eq!(feed.podcast.title, "Test Show");
        assert_eq!(feed.podcast.url, url);
        assert_eq!(titles(&feed.items), vec!["ep1", "ep2"]);

        let stored = PodcastRepository::new(service.db().pool())
            .get_by_url(&url)
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_get_podcast_details_invalid_url() {
        let (service, _server, _url) = setup().await;

        assert_eq!(
            service.get_podcast_details("not a url").await.unwrap_err(),
            ServiceError::PodcastBuild
        );
        assert_eq!(
            service
                .get_podcast_details("http://127.0.0.1:1/feed.xml")
                .await
                .unwrap_err(),
            ServiceError::PodcastBuild
        );
    }

    #[tokio::test]
    async fn test_subscribe_twice_has_single_entry() {
        let (service, _server, url) = setup().await;
        service.create_user("alice@example.com", "pw").await.unwrap();

        service.subscribe("alice@example.com", &url).await.unwrap();
        service.subscribe("alice@example.com", &url).await.unwrap();

        let subs = service.get_user_subscriptions("alice@example.com").await.unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].url, url);
        assert_eq!(subs[0].title, "Test Show");

        let user = service.get_user("alice@example.com").await.unwrap();
        assert_eq!(user.podcasts.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_subscribes_keep_both() {
        let (service, _server, url) = setup().await;
        service.create_user("alice@example.com", "pw").await.unwrap();
        service.create_user("bob@example.com", "pw").await.unwrap();

        let (a, b) = tokio::join!(
            service.subscribe("alice@example.com", &url),
            service.subscribe("bob@example.com", &url),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(service.get_user_subscriptions("alice@example.com").await.unwrap().len(), 1);
        assert_eq!(service.get_user_subscriptions("bob@example.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_unknown_user() {
        let (service, _server, url) = setup().await;
        assert_eq!(
            service.subscribe("nobody@example.com", &url).await,
            Err(ServiceError::UserFetch)
        );
    }

    #[tokio::test]
    async fn test_subscribe_bad_feed() {
        let (service, _server, _url) = setup().await;
        service.create_user("alice@example.com", "pw").await.unwrap();

        assert_eq!(
            service.subscribe("alice@example.com", "ftp://example.com/feed").await,
            Err(ServiceError::PodcastBuild)
        );
        assert!(service
            .get_user_subscriptions("alice@example.com")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let (service, _server, url) = setup().await;
        service.create_user("alice@example.com", "pw").await.unwrap();
        service.subscribe("alice@example.com", &url).await.unwrap();

        service.unsubscribe("alice@example.com", &url).await.unwrap();
        service.unsubscribe("alice@example.com", &url).await.unwrap();
        service
            .unsubscribe("alice@example.com", "https://never.example.com/feed")
            .await
            .unwrap();

        assert!(service
            .get_user_subscriptions("alice@example.com")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_subscription_details() {
        let (service, _server, url) = setup().await;
        service.create_user("alice@example.com", "pw").await.unwrap();

        assert_eq!(
            service
                .get_subscription_details("alice@example.com", &url)
                .await
                .unwrap_err(),
            ServiceError::PodcastFetch
        );

        service.subscribe("alice@example.com", &url).await.unwrap();
        let details = service
            .get_subscription_details("alice@example.com", &url)
            .await
            .unwrap();
        assert_eq!(details.podcast.url, url);
        assert_eq!(titles(&details.items), vec!["ep1", "ep2"]);
        assert_eq!(details.items[0].media_url, "https://cdn.example.com/ep1.mp3");
    }

    #[tokio::test]
    async fn test_get_new_items() {
        let (service, _server, url) = setup().await;

        let all = service.get_new_items::<NewPodcastItem>(&url, &[]).await.unwrap();
        assert_eq!(titles(&all), vec!["ep2", "ep1"]);

        let known = service.get_podcast_details(&url).await.unwrap().items;
        assert!(service.get_new_items(&url, &known).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_subscription_appends_new_items() {
        let (service, server, url) = setup().await;
        service.create_user("alice@example.com", "pw").await.unwrap();
        service.subscribe("alice@example.com", &url).await.unwrap();

        serve_feed(&server, &["ep1", "ep2", "ep3", "ep4"]).await;

        let found = service
            .refresh_subscription("alice@example.com", &url)
            .await
            .unwrap();
        assert_eq!(titles(&found), vec!["ep4", "ep3"]);

        let details = service
            .get_subscription_details("alice@example.com", &url)
            .await
            .unwrap();
        assert_eq!(titles(&details.items), vec!["ep1", "ep2", "ep3", "ep4"]);

        // Nothing new the second time
        let found = service
            .refresh_subscription("alice@example.com", &url)
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_podcast_counts_new_items() {
        let (service, server, url) = setup().await;
        service.create_user("alice@example.com", "pw").await.unwrap();
        service.subscribe("alice@example.com", &url).await.unwrap();
        let podcast = PodcastRepository::new(service.db().pool())
            .get_by_url(&url)
            .await
            .unwrap()
            .unwrap();

        serve_feed(&server, &["ep1", "ep2", "ep3"]).await;
        assert_eq!(service.refresh_podcast(&podcast).await.unwrap(), 1);
        assert_eq!(service.refresh_podcast(&podcast).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_store_each_episode_once() {
        let (service, server, url) = setup().await;
        service.create_user("alice@example.com", "pw").await.unwrap();
        service.subscribe("alice@example.com", &url).await.unwrap();
        let podcast = PodcastRepository::new(service.db().pool())
            .get_by_url(&url)
            .await
            .unwrap()
            .unwrap();

        serve_feed(&server, &["ep1", "ep2", "ep3"]).await;

        let (counted, found) = tokio::join!(
            service.refresh_podcast(&podcast),
            service.refresh_subscription("alice@example.com", &url),
        );
        assert_eq!(counted.unwrap() + found.unwrap().len(), 1);

        let details = service
            .get_subscription_details("alice@example.com", &url)
            .await
            .unwrap();
        assert_eq!(titles(&details.items), vec!["ep1", "ep2", "ep3"]);
    }

    #[tokio::test]
    async fn test_refresh_unsubscribed() {
        let (service, _server, url) = setup().await;
        service.create_user("alice@example.com", "pw").await.unwrap();

        assert_eq!(
            service.refresh_subscription("alice@example.com", &url).await,
            Err(ServiceError::PodcastFetch)
        );
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (service, _server, _url) = setup().await;
        service.create_user("alice@example.com", "pw").await.unwrap();

        service.delete_user("alice@example.com").await.unwrap();

        assert_eq!(
            service.get_user("alice@example.com").await.unwrap_err(),
            ServiceError::UserFetch
        );
        assert_eq!(
            service.get_token("alice@example.com", "pw").await,
            Err(ServiceError::UserFetch)
        );
        assert_eq!(
            service.delete_user("alice@example.com").await,
            Err(ServiceError::UserFetch)
        );
    }
}
