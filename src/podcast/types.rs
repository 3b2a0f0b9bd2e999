//! Podcast types for podcastmg.

use chrono::{DateTime, Utc};

/// Media length recorded for entries that carry no enclosure.
pub const NO_ENCLOSURE_MEDIA_LENGTH: &str = "0";

/// A stored podcast.
#[derive(Debug, Clone, PartialEq)]
pub struct Podcast {
    /// Podcast ID.
    pub id: i64,
    /// Feed URL (unique, never changes).
    pub url: String,
    /// Feed title.
    pub title: String,
    /// Feed description.
    pub description: String,
    /// Cover image URL.
    pub image_url: String,
    /// When the podcast was first stored.
    pub created_at: DateTime<Utc>,
    /// When the metadata was last refreshed.
    pub updated_at: DateTime<Utc>,
}

/// A stored episode.
#[derive(Debug, Clone, PartialEq)]
pub struct PodcastItem {
    /// Item ID.
    pub id: i64,
    /// Podcast this item belongs to.
    pub podcast_id: i64,
    pub title: String,
    pub content: String,
    pub description: String,
    /// Enclosure URL, empty when the entry had none.
    pub media_url: String,
    /// Declared enclosure size as text.
    pub media_length: String,
    pub image_url: String,
    /// Publish time from the feed.
    pub published: Option<DateTime<Utc>>,
    /// When the item was stored.
    pub created_at: DateTime<Utc>,
}

/// Podcast metadata produced from a parsed feed, not yet stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPodcast {
    pub url: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
}

impl NewPodcast {
    /// Create podcast metadata for a feed URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the image URL.
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }
}

/// An episode produced from a parsed feed entry, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPodcastItem {
    pub title: String,
    pub content: String,
    pub description: String,
    pub media_url: String,
    pub media_length: String,
    pub image_url: String,
    pub published: Option<DateTime<Utc>>,
}

impl NewPodcastItem {
    /// Create an episode without an enclosure.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
            description: String::new(),
            media_url: String::new(),
            media_length: NO_ENCLOSURE_MEDIA_LENGTH.to_string(),
            image_url: String::new(),
            published: None,
        }
    }

    /// Attach an enclosure.
    pub fn with_media(mut self, url: impl Into<String>, length: impl Into<String>) -> Self {
        self.media_url = url.into();
        self.media_length = length.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the publish time.
    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }
}

impl From<PodcastItem> for NewPodcastItem {
    fn from(item: PodcastItem) -> Self {
        Self {
            title: item.title,
            content: item.content,
            description: item.description,
            media_url: item.media_url,
            media_length: item.media_length,
            image_url: item.image_url,
            published: item.published,
        }
    }
}

/// A freshly fetched and normalized feed.
#[derive(Debug, Clone, PartialEq)]
pub struct PodcastFeed {
    pub podcast: NewPodcast,
    /// Episodes in feed document order.
    pub items: Vec<NewPodcastItem>,
}

/// A stored podcast together with its episodes.
#[derive(Debug, Clone, PartialEq)]
pub struct PodcastWithItems {
    pub podcast: Podcast,
    /// Episodes in insertion order.
    pub items: Vec<PodcastItem>,
}

/// A stored podcast with its number of active subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct PodcastWithSubscribers {
    pub podcast: Podcast,
    pub subscriber_count: i64,
}

/// Identity of an episode for diffing: (title, media URL).
pub trait EpisodeKey {
    fn title(&self) -> &str;
    fn media_url(&self) -> &str;

    /// Whether two episodes refer to the same entry.
    fn same_episode<O: EpisodeKey + ?Sized>(&self, other: &O) -> bool {
        self.title() == other.title() && self.media_url() == other.media_url()
    }
}

impl EpisodeKey for PodcastItem {
    fn title(&self) -> &str {
        &self.title
    }

    fn media_url(&self) -> &str {
        &self.media_url
    }
}

impl EpisodeKey for NewPodcastItem {
    fn title(&self) -> &str {
        &self.title
    }

    fn media_url(&self) -> &str {
        &self.media_url
    }
}
