//! Subscription repository: the user <-> podcast join table.

use super::DbPool;
use crate::podcast::repository::{PodcastRow, PODCAST_COLUMNS};
use crate::podcast::Podcast;
use crate::Result;

/// Repository for subscription pairs.
pub struct SubscriptionRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SubscriptionRepository<'a> {
    /// Create a new SubscriptionRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Subscribe a user to a podcast.
    ///
    /// Returns false if the pair already existed; the call is idempotent.
    pub async fn subscribe(&self, user_id: i64, podcast_id: i64) -> Result<bool> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO subscriptions (user_id, podcast_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(podcast_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a subscription. Returns false if there was none.
    pub async fn unsubscribe(&self, user_id: i64, podcast_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = ? AND podcast_id = ?")
            .bind(user_id)
            .bind(podcast_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List the podcasts a user is subscribed to, oldest subscription first.
    pub async fn list_podcasts_for_user(&self, user_id: i64) -> Result<Vec<Podcast>> {
        let sql = format!(
            "SELECT {PODCAST_COLUMNS}
             FROM podcasts p
             INNER JOIN subscriptions s ON s.podcast_id = p.id
             WHERE s.user_id = ?
             ORDER BY s.created_at ASC, p.id ASC"
        );
        let rows = sqlx::query_as::<_, PodcastRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Podcast::from).collect())
    }

    /// Get the podcast at `url` if the user is subscribed to it.
    pub async fn get_subscribed_podcast(&self, user_id: i64, url: &str) -> Result<Option<Podcast>> {
        let sql = format!(
            "SELECT {PODCAST_COLUMNS}
             FROM podcasts p
             INNER JOIN subscriptions s ON s.podcast_id = p.id
             WHERE s.user_id = ? AND p.url = ?"
        );
        let row = sqlx::query_as::<_, PodcastRow>(&sql)
            .bind(user_id)
            .bind(url)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Podcast::from))
    }
}
