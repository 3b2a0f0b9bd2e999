//! Database schema and migrations for podcastmg.
//!
//! Migrations are applied in order when the database is opened. The
//! schema_version table tracks which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,           -- Argon2id PHC string
    is_admin    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    deleted_at  TEXT                     -- soft delete marker
);

CREATE INDEX idx_users_deleted_at ON users(deleted_at);
"#,
    // v2: podcasts and their items
    r#"
CREATE TABLE podcasts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    url         TEXT NOT NULL UNIQUE,
    title       TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    image_url   TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE podcast_items (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    podcast_id   INTEGER NOT NULL REFERENCES podcasts(id) ON DELETE CASCADE,
    title        TEXT NOT NULL DEFAULT '',
    content      TEXT NOT NULL DEFAULT '',
    description  TEXT NOT NULL DEFAULT '',
    media_url    TEXT NOT NULL DEFAULT '',
    media_length TEXT NOT NULL DEFAULT '',  -- "0" when the entry had no enclosure
    image_url    TEXT NOT NULL DEFAULT '',
    published_at TEXT,
    created_at   TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_podcast_items_podcast_id ON podcast_items(podcast_id);
"#,
    // v3: user <-> podcast subscriptions
    r#"
CREATE TABLE subscriptions (
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    podcast_id  INTEGER NOT NULL REFERENCES podcasts(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (user_id, podcast_id)
);

CREATE INDEX idx_subscriptions_podcast_id ON subscriptions(podcast_id);
"#,
    // v4: one row per episode of a podcast
    r#"
DELETE FROM podcast_items
WHERE id NOT IN (
    SELECT MIN(id) FROM podcast_items GROUP BY podcast_id, title, media_url
);

CREATE UNIQUE INDEX idx_podcast_items_episode ON podcast_items(podcast_id, title, media_url);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_first_migration_creates_users_table() {
        assert!(MIGRATIONS[0].contains("CREATE TABLE users"));
        assert!(MIGRATIONS[0].contains("email       TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn test_subscription_pair_is_primary_key() {
        assert!(MIGRATIONS[2].contains("PRIMARY KEY (user_id, podcast_id)"));
    }

    #[test]
    fn test_episode_key_is_unique() {
        assert!(MIGRATIONS[3].contains("UNIQUE INDEX idx_podcast_items_episode"));
        assert!(MIGRATIONS[3].contains("(podcast_id, title, media_url)"));
    }
}
