//! Response DTOs for Web API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::podcast::{NewPodcastItem, Podcast, PodcastFeed, PodcastItem, PodcastWithItems};
use crate::service::UserWithPodcasts;

/// `{"status": true}` on success.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: bool,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: true }
    }
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Signed access token (JWT).
    pub token_string: String,
}

/// User response wrapper.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserDto,
}

/// A user as exposed over HTTP. Credentials never leave the server.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub user_email: String,
    pub podcasts: Vec<PodcastDto>,
}

impl From<UserWithPodcasts> for UserDto {
    fn from(value: UserWithPodcasts) -> Self {
        Self {
            user_email: value.user.email,
            podcasts: value.podcasts.into_iter().map(PodcastDto::from).collect(),
        }
    }
}

/// Podcast response wrapper.
#[derive(Debug, Serialize)]
pub struct PodcastResponse {
    pub podcast: PodcastDto,
}

/// Subscription list response.
#[derive(Debug, Serialize)]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<PodcastDto>,
}

/// Episodes found by a refresh, newest first.
#[derive(Debug, Serialize)]
pub struct NewItemsResponse {
    pub new_items: Vec<PodcastItemDto>,
}

/// A podcast as exposed over HTTP.
///
/// `id` is absent for feeds that were fetched but not stored.
#[derive(Debug, Serialize)]
pub struct PodcastDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub url: String,
    pub podcast_items: Vec<PodcastItemDto>,
}

impl From<Podcast> for PodcastDto {
    fn from(podcast: Podcast) -> Self {
        Self {
            id: Some(podcast.id),
            title: podcast.title,
            description: podcast.description,
            image_url: podcast.image_url,
            url: podcast.url,
            podcast_items: Vec::new(),
        }
    }
}

impl From<PodcastWithItems> for PodcastDto {
    fn from(value: PodcastWithItems) -> Self {
        let mut dto = PodcastDto::from(value.podcast);
        dto.podcast_items = value.items.into_iter().map(PodcastItemDto::from).collect();
        dto
    }
}

impl From<PodcastFeed> for PodcastDto {
    fn from(feed: PodcastFeed) -> Self {
        Self {
            id: None,
            title: feed.podcast.title,
            description: feed.podcast.description,
            image_url: feed.podcast.image_url,
            url: feed.podcast.url,
            podcast_items: feed.items.into_iter().map(PodcastItemDto::from).collect(),
        }
    }
}

/// An episode as exposed over HTTP.
#[derive(Debug, Serialize)]
pub struct PodcastItemDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub podcast_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub description: String,
    pub media_url: String,
    pub media_length: String,
    pub image_url: String,
    pub published: Option<DateTime<Utc>>,
}

impl From<PodcastItem> for PodcastItemDto {
    fn from(item: PodcastItem) -> Self {
        Self {
            podcast_id: Some(item.podcast_id),
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

impl From<NewPodcastItem> for PodcastItemDto {
    fn from(item: NewPodcastItem) -> Self {
        Self {
            podcast_id: None,
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
