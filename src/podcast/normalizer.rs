//! Maps parsed feed documents into podcast and episode values.

use feed_rs::model::{Entry, Feed, Text};

use super::types::{NewPodcast, NewPodcastItem, PodcastFeed, NO_ENCLOSURE_MEDIA_LENGTH};

/// Normalize a parsed feed fetched from `url`.
///
/// Produces one episode per entry, in document order.
pub fn normalize_feed(url: &str, feed: Feed) -> PodcastFeed {
    let image_url = feed
        .logo
        .map(|image| image.uri)
        .or_else(|| feed.icon.map(|image| image.uri))
        .unwrap_or_default();

    let podcast = NewPodcast {
        url: url.to_string(),
        title: text_or_empty(feed.title),
        description: text_or_empty(feed.description),
        image_url,
    };

    let items = feed.entries.into_iter().map(normalize_entry).collect();

    PodcastFeed { podcast, items }
}

/// Normalize a single feed entry.
pub fn normalize_entry(entry: Entry) -> NewPodcastItem {
    let (media_url, media_length) = match enclosure(&entry) {
        Some((url, size)) => (url, size.map(|s| s.to_string()).unwrap_or_default()),
        None => (String::new(), NO_ENCLOSURE_MEDIA_LENGTH.to_string()),
    };

    let image_url = entry
        .media
        .iter()
        .flat_map(|media| media.thumbnails.iter())
        .map(|thumbnail| thumbnail.image.uri.clone())
        .next()
        .unwrap_or_default();

    NewPodcastItem {
        title: text_or_empty(entry.title),
        content: entry.content.and_then(|c| c.body).unwrap_or_default(),
        description: text_or_empty(entry.summary),
        media_url,
        media_length,
        image_url,
        published: entry.published.or(entry.updated),
    }
}

/// First enclosure of an entry as (url, declared size).
fn enclosure(entry: &Entry) -> Option<(String, Option<u64>)> {
    let from_media = entry
        .media
        .iter()
        .flat_map(|media| media.content.iter())
        .find_map(|content| {
            content
                .url
                .as_ref()
                .map(|url| (url.to_string(), content.size))
        });

    from_media.or_else(|| {
        entry
            .links
            .iter()
            .find(|link| link.rel.as_deref() == Some("enclosure"))
            .map(|link| (link.href.clone(), link.length))
    })
}

fn text_or_empty(text: Option<Text>) -> String {
    text.map(|t| t.content).unwrap_or_default()
}
