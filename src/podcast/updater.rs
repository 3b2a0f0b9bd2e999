//! Background podcast updater.
//!
//! Periodically refreshes every podcast that still has subscribers, storing
//! newly published episodes.

use futures::stream::{self, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::repository::PodcastRepository;
use crate::config::UpdaterConfig;
use crate::service::PodcastManageService;

/// Default update interval in seconds (30 minutes).
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 1800;

/// Default number of feeds refreshed at the same time.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Summary of one update pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Podcasts that were checked.
    pub checked: usize,
    /// Podcasts whose refresh failed.
    pub failed: usize,
    /// Episodes stored across all podcasts.
    pub new_items: usize,
}

/// Podcast background updater.
pub struct PodcastUpdater {
    service: PodcastManageService,
    update_interval: Duration,
    concurrency: usize,
}

impl PodcastUpdater {
    /// Create an updater with default settings.
    pub fn new(service: PodcastManageService) -> Self {
        Self {
            service,
            update_interval: Duration::from_secs(DEFAULT_UPDATE_INTERVAL_SECS),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Create an updater from configuration.
    pub fn with_config(service: PodcastManageService, config: &UpdaterConfig) -> Self {
        Self {
            service,
            update_interval: Duration::from_secs(config.interval_secs.max(1)),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Run the updater loop forever.
    pub async fn run(&self) {
        info!(
            "Podcast updater started (interval: {} seconds, concurrency: {})",
            self.update_interval.as_secs(),
            self.concurrency
        );

        let mut timer = interval(self.update_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            self.update_all().await;
        }
    }

    /// Refresh every podcast that has at least one subscriber.
    pub async fn update_all(&self) -> UpdateSummary {
        let podcasts = match PodcastRepository::new(self.service.db().pool())
            .list_with_subscribers()
            .await
        {
            Ok(podcasts) => podcasts,
            Err(e) => {
                error!("Failed to list subscribed podcasts: {}", e);
                return UpdateSummary::default();
            }
        };

        if podcasts.is_empty() {
            debug!("No subscribed podcasts to update");
            return UpdateSummary::default();
        }

        info!("Updating {} podcast(s)", podcasts.len());

        let results: Vec<_> = stream::iter(podcasts)
            .map(|entry| {
                let service = self.service.clone();
                async move {
                    let result = service.refresh_podcast(&entry.podcast).await;
                    (entry.podcast, result)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut summary = UpdateSummary {
            checked: results.len(),
            ..UpdateSummary::default()
        };
        for (podcast, result) in results {
            match result {
                Ok(count) => summary.new_items += count,
                Err(e) => {
                    warn!("Failed to update podcast {} ({}): {}", podcast.id, podcast.url, e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Podcast update finished: {} checked, {} failed, {} new episode(s)",
            summary.checked, summary.failed, summary.new_items
        );
        summary
    }
}

/// Spawn the updater as a background task.
pub fn start_podcast_updater(
    service: PodcastManageService,
    config: &UpdaterConfig,
) -> JoinHandle<()> {
    let updater = PodcastUpdater::with_config(service, config);
    tokio::spawn(async move {
        updater.run().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenIssuer;
    use crate::config::FeedConfig;
    use crate::db::Database;
    use crate::podcast::FeedFetcher;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rss(titles: &[&str]) -> String {
        let items: String = titles
            .iter()
            .map(|t| format!("<item><title>{t}</title><guid>{t}</guid></item>"))
            .collect();
        format!(
            "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel>\
             <title>Show</title>{items}</channel></rss>"
        )
    }

    async fn mount(server: &MockServer, route: &str, titles: &[&str]) {
        Mock::given(method("GET"))
            .and(path(route.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(rss(titles)))
            .mount(server)
            .await;
    }

    async fn setup_service() -> PodcastManageService {
        let db = Database::open_in_memory().await.unwrap();
        let fetcher = FeedFetcher::new(&FeedConfig {
            allow_private_hosts: true,
            ..FeedConfig::default()
        })
        .unwrap();
        PodcastManageService::new(db, fetcher, Arc::new(TokenIssuer::new("secret", 3600)))
    }

    #[tokio::test]
    async fn test_updater_new() {
        let updater = PodcastUpdater::new(setup_service().await);
        assert_eq!(
            updater.update_interval,
            Duration::from_secs(DEFAULT_UPDATE_INTERVAL_SECS)
        );
        assert_eq!(updater.concurrency, DEFAULT_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_updater_with_config_clamps_zero_values() {
        let config = UpdaterConfig {
            enabled: true,
            interval_secs: 0,
            concurrency: 0,
        };
        let updater = PodcastUpdater::with_config(setup_service().await, &config);
        assert_eq!(updater.update_interval, Duration::from_secs(1));
        assert_eq!(updater.concurrency, 1);
    }

    #[tokio::test]
    async fn test_update_all_without_podcasts() {
        let updater = PodcastUpdater::new(setup_service().await);
        assert_eq!(updater.update_all().await, UpdateSummary::default());
    }

    #[tokio::test]
    async fn test_update_all_stores_new_episodes() {
        let service = setup_service().await;
        let server = MockServer::start().await;
        mount(&server, "/a.xml", &["a1"]).await;
        mount(&server, "/b.xml", &["b1"]).await;
        let url_a = format!("{}/a.xml", server.uri());
        let url_b = format!("{}/b.xml", server.uri());

        service.create_user("alice@example.com", "pw").await.unwrap();
        service.subscribe("alice@example.com", &url_a).await.unwrap();
        service.subscribe("alice@example.com", &url_b).await.unwrap();

        server.reset().await;
        mount(&server, "/a.xml", &["a1", "a2", "a3"]).await;
        // b.xml now fails with 404

        let updater = PodcastUpdater::new(service.clone());
        let summary = updater.update_all().await;
        assert_eq!(
            summary,
            UpdateSummary {
                checked: 2,
                failed: 1,
                new_items: 2,
            }
        );

        let details = service
            .get_subscription_details("alice@example.com", &url_a)
            .await
            .unwrap();
        assert_eq!(details.items.len(), 3);
    }
}
