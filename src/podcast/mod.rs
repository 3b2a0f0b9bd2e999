//! Podcast feeds: fetching, normalization, diffing and storage.

pub mod diff;
pub mod fetcher;
pub mod normalizer;
pub mod repository;
pub mod types;
pub mod updater;

pub use diff::new_items;
pub use fetcher::{parse_feed, validate_url, FeedFetcher};
pub use normalizer::{normalize_entry, normalize_feed};
pub use repository::{PodcastItemRepository, PodcastRepository};
pub use types::{
    EpisodeKey, NewPodcast, NewPodcastItem, Podcast, PodcastFeed, PodcastItem, PodcastWithItems,
    PodcastWithSubscribers, NO_ENCLOSURE_MEDIA_LENGTH,
};
pub use updater::{
    start_podcast_updater, PodcastUpdater, UpdateSummary, DEFAULT_CONCURRENCY,
    DEFAULT_UPDATE_INTERVAL_SECS,
};
