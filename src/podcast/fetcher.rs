//! Feed fetcher with SSRF protection and resource limits.

use std::net::IpAddr;
use std::time::Duration;

use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::config::FeedConfig;
use crate::error::{PodcastMgError, Result};

/// User agent string for feed fetching.
const USER_AGENT: &str = concat!("podcastmg/", env!("CARGO_PKG_VERSION"));

/// Fetches remote feed documents and parses them with `feed-rs`.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    max_feed_size: u64,
    allow_private_hosts: bool,
}

impl FeedFetcher {
    /// Create a fetcher from the feed configuration.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(redirect_policy(
                config.max_redirects,
                config.allow_private_hosts,
            ))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PodcastMgError::Feed(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
            allow_private_hosts: config.allow_private_hosts,
        })
    }

    /// Fetch and parse the feed at `url`.
    ///
    /// Fails with [`PodcastMgError::Feed`] on an invalid or refused URL,
    /// a transport error, a non-success status, an oversized body or an
    /// unparseable document.
    pub async fn fetch(&self, url: &str) -> Result<Feed> {
        if self.allow_private_hosts {
            validate_scheme(url)?;
        } else {
            validate_url(url)?;
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PodcastMgError::Feed(format!("failed to fetch feed: {e}")))?;

        if !response.status().is_success() {
            return Err(PodcastMgError::Feed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(self.too_large(content_length));
            }
        }

        // Content-Length can be absent or wrong; enforce the cap while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| PodcastMgError::Feed(format!("failed to read response: {e}")))?
        {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_feed_size {
                return Err(self.too_large(body.len() as u64));
            }
        }

        parse_feed(&body)
    }

    fn too_large(&self, size: u64) -> PodcastMgError {
        PodcastMgError::Feed(format!(
            "feed too large: {} bytes (max {} bytes)",
            size, self.max_feed_size
        ))
    }
}

/// Redirect policy for feed requests.
///
/// Unless private hosts are allowed, every hop is validated like the
/// requested URL.
fn redirect_policy(max_redirects: usize, allow_private_hosts: bool) -> Policy {
    if allow_private_hosts {
        return Policy::limited(max_redirects);
    }

    Policy::custom(move |attempt| {
        match check_redirect(attempt.url().as_str(), attempt.previous().len(), max_redirects) {
            Ok(()) => attempt.follow(),
            Err(e) => attempt.error(e),
        }
    })
}

/// Check one redirect hop. `previous` counts the URLs already visited,
/// the requested one included.
fn check_redirect(target: &str, previous: usize, max_redirects: usize) -> Result<()> {
    if previous > max_redirects {
        return Err(PodcastMgError::Feed(format!(
            "too many redirects (max {max_redirects})"
        )));
    }
    validate_url(target)
}

/// Parse feed bytes (RSS 0.9x/1.0/2.0, Atom or JSON Feed).
pub fn parse_feed(bytes: &[u8]) -> Result<Feed> {
    parser::parse(bytes).map_err(|e| PodcastMgError::Feed(format!("failed to parse feed: {e}")))
}

fn parse_http_url(url: &str) -> Result<url::Url> {
    let parsed =
        url::Url::parse(url).map_err(|e| PodcastMgError::Feed(format!("invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(PodcastMgError::Feed(format!(
            "unsupported URL scheme: {scheme}"
        ))),
    }
}

fn validate_scheme(url: &str) -> Result<()> {
    parse_http_url(url).map(|_| ())
}

/// Validate a feed URL for SSRF protection.
///
/// Accepts only http/https URLs whose host is neither a private, loopback or
/// reserved address nor an internal hostname.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = parse_http_url(url)?;

    let host = parsed
        .host()
        .ok_or_else(|| PodcastMgError::Feed("URL has no host".to_string()))?;

    match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(PodcastMgError::Feed(format!("forbidden host: {domain}")));
            }
        }
        url::Host::Ipv4(ipv4) => check_ip(IpAddr::V4(ipv4))?,
        url::Host::Ipv6(ipv6) => check_ip(IpAddr::V6(ipv6))?,
    }

    Ok(())
}

fn check_ip(ip: IpAddr) -> Result<()> {
    if is_private_ip(&ip) {
        return Err(PodcastMgError::Feed(format!(
            "private IP address not allowed: {ip}"
        )));
    }
    Ok(())
}

fn is_forbidden_hostname(host: &str) -> bool {
    let host_lower = host.to_lowercase();

    if host_lower == "localhost" {
        return true;
    }

    const FORBIDDEN_SUFFIXES: [&str; 7] = [
        ".local",
        ".localhost",
        ".internal",
        ".intranet",
        ".corp",
        ".home",
        ".lan",
    ];

    FORBIDDEN_SUFFIXES
        .iter()
        .any(|suffix| host_lower.ends_with(suffix))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();

            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                || ipv4.is_documentation()
                // Carrier-grade NAT: 100.64.0.0/10
                || (octets[0] == 100 && (64..=127).contains(&octets[1]))
        }
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped));
            }

            let segments = ipv6.segments();
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // Unique local: fc00::/7
                || (segments[0] & 0xfe00) == 0xfc00
                // Link-local: fe80::/10
                || (segments[0] & 0xffc0) == 0xfe80
        }
    }
}
