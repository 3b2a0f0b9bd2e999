//! Podcast repositories.

use chrono::Utc;

use super::types::{
    NewPodcast, NewPodcastItem, Podcast, PodcastItem, PodcastWithItems, PodcastWithSubscribers,
};
use crate::db::{parse_datetime, DbPool};
use crate::{PodcastMgError, Result};

/// Row type for podcast from database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PodcastRow {
    id: i64,
    url: String,
    title: String,
    description: String,
    image_url: String,
    created_at: String,
    updated_at: String,
}

impl From<PodcastRow> for Podcast {
    fn from(row: PodcastRow) -> Self {
        Podcast {
            id: row.id,
            url: row.url,
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for podcast with subscriber count.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PodcastWithSubscribersRow {
    #[sqlx(flatten)]
    podcast: PodcastRow,
    subscriber_count: i64,
}

/// Row type for podcast item from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PodcastItemRow {
    id: i64,
    podcast_id: i64,
    title: String,
    content: String,
    description: String,
    media_url: String,
    media_length: String,
    image_url: String,
    published_at: Option<String>,
    created_at: String,
}

impl From<PodcastItemRow> for PodcastItem {
    fn from(row: PodcastItemRow) -> Self {
        PodcastItem {
            id: row.id,
            podcast_id: row.podcast_id,
            title: row.title,
            content: row.content,
            description: row.description,
            media_url: row.media_url,
            media_length: row.media_length,
            image_url: row.image_url,
            published: row.published_at.and_then(|s| parse_datetime(&s)),
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

pub(crate) const PODCAST_COLUMNS: &str =
    "p.id, p.url, p.title, p.description, p.image_url, p.created_at, p.updated_at";

const ITEM_COLUMNS: &str = "id, podcast_id, title, content, description, media_url, \
     media_length, image_url, published_at, created_at";

const INSERT_ITEM_SQL: &str = "INSERT OR IGNORE INTO podcast_items \
     (podcast_id, title, content, description, media_url, media_length, image_url, published_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?)";

/// Insert items in order on an open connection or transaction.
///
/// Episodes already stored for the podcast are skipped. Returns the
/// items that were written.
async fn insert_items<'i>(
    conn: &mut sqlx::SqliteConnection,
    podcast_id: i64,
    items: &'i [NewPodcastItem],
) -> Result<Vec<&'i NewPodcastItem>> {
    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
        let result = sqlx::query(INSERT_ITEM_SQL)
            .bind(podcast_id)
            .bind(&item.title)
            .bind(&item.content)
            .bind(&item.description)
            .bind(&item.media_url)
            .bind(&item.media_length)
            .bind(&item.image_url)
            .bind(item.published.map(|p| p.to_rfc3339()))
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() > 0 {
            inserted.push(item);
        }
    }
    Ok(inserted)
}

/// Map a unique violation on `podcasts.url` to a podcast-specific error.
fn podcast_conflict(e: sqlx::Error) -> PodcastMgError {
    match PodcastMgError::from(e) {
        PodcastMgError::AlreadyExists(_) => PodcastMgError::AlreadyExists("podcast".to_string()),
        other => other,
    }
}

/// Repository for podcast metadata.
pub struct PodcastRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PodcastRepository<'a> {
    /// Create a new PodcastRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Store a podcast and its items in one transaction.
    ///
    /// Items are inserted in slice order and an episode repeated within the
    /// feed is stored once. A duplicate URL fails with
    /// [`PodcastMgError::AlreadyExists`] and nothing is written.
    pub async fn create_with_items(
        &self,
        podcast: &NewPodcast,
        items: &[NewPodcastItem],
    ) -> Result<Podcast> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO podcasts (url, title, description, image_url)
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&podcast.url)
        .bind(&podcast.title)
        .bind(&podcast.description)
        .bind(&podcast.image_url)
        .fetch_one(&mut *tx)
        .await
        .map_err(podcast_conflict)?;

        insert_items(&mut *tx, id, items).await?;
        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| PodcastMgError::NotFound("podcast".to_string()))
    }

    /// Get a podcast by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Podcast>> {
        let sql = format!("SELECT {PODCAST_COLUMNS} FROM podcasts p WHERE p.id = ?");
        let row = sqlx::query_as::<_, PodcastRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Podcast::from))
    }

    /// Get a podcast by feed URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Podcast>> {
        let sql = format!("SELECT {PODCAST_COLUMNS} FROM podcasts p WHERE p.url = ?");
        let row = sqlx::query_as::<_, PodcastRow>(&sql)
            .bind(url)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Podcast::from))
    }

    /// Get a podcast by ID together with its items.
    pub async fn get_with_items(&self, id: i64) -> Result<Option<PodcastWithItems>> {
        let Some(podcast) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = PodcastItemRepository::new(self.pool)
            .list_by_podcast(podcast.id)
            .await?;
        Ok(Some(PodcastWithItems { podcast, items }))
    }

    /// Refresh title, description and image. The URL never changes.
    pub async fn update_metadata(&self, id: i64, podcast: &NewPodcast) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE podcasts SET title = ?, description = ?, image_url = ?,
                    updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(&podcast.title)
        .bind(&podcast.description)
        .bind(&podcast.image_url)
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List podcasts that have at least one active subscriber.
    pub async fn list_with_subscribers(&self) -> Result<Vec<PodcastWithSubscribers>> {
        let sql = format!(
            "SELECT {PODCAST_COLUMNS}, COUNT(s.user_id) AS subscriber_count
             FROM podcasts p
             INNER JOIN subscriptions s ON s.podcast_id = p.id
             INNER JOIN users u ON u.id = s.user_id AND u.deleted_at IS NULL
             GROUP BY p.id
             ORDER BY p.id ASC"
        );
        let rows = sqlx::query_as::<_, PodcastWithSubscribersRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| PodcastWithSubscribers {
                podcast: row.podcast.into(),
                subscriber_count: row.subscriber_count,
            })
            .collect())
    }
}

/// Repository for podcast items.
pub struct PodcastItemRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PodcastItemRepository<'a> {
    /// Create a new PodcastItemRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// List a podcast's items in insertion order.
    pub async fn list_by_podcast(&self, podcast_id: i64) -> Result<Vec<PodcastItem>> {
        let sql =
            format!("SELECT {ITEM_COLUMNS} FROM podcast_items WHERE podcast_id = ? ORDER BY id ASC");
        let rows = sqlx::query_as::<_, PodcastItemRow>(&sql)
            .bind(podcast_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(PodcastItem::from).collect())
    }

    /// Append items to a podcast in one transaction, in slice order.
    ///
    /// An item whose title and media URL are already stored for the podcast
    /// is skipped. Returns the items that were actually appended.
    pub async fn append(
        &self,
        podcast_id: i64,
        items: &[NewPodcastItem],
    ) -> Result<Vec<NewPodcastItem>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let inserted = insert_items(&mut *tx, podcast_id, items)
            .await?
            .into_iter()
            .cloned()
            .collect();
        tx.commit().await?;

        Ok(inserted)
    }
}
