//! Exchange-filings evidence for corporate announcements, backed by the BSE corporate
//! announcements XML feed.

use anyhow::Context;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Duration;

const DEFAULT_FEED_URL: &str = "https://www.bseindia.com/xml-data/corpfiling/BA_Ann.xml";

/// Budget for the feed fetch behind an announcement check.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_millis(2_500);
/// Budget for the latest-filings listing.
pub const LATEST_TIMEOUT: Duration = Duration::from_secs(3);
pub const MAX_LATEST_ITEMS: usize = 15;

// Query words shorter than this are too common to count as a feed hit.
const MIN_QUERY_WORD: usize = 4;

#[async_trait::async_trait]
pub trait FilingsFeed: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Raw feed body. Must give up after `timeout`.
    async fn fetch_feed(&self, timeout: Duration) -> anyhow::Result<String>;
}

#[derive(Debug, Clone)]
pub struct BseFeedClient {
    http: reqwest::Client,
    url: String,
}

impl BseFeedClient {
    pub fn from_env() -> anyhow::Result<Self> {
        let url = std::env::var("BSE_FEED_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FEED_URL.to_string());

        let http = reqwest::Client::builder()
            .build()
            .context("failed to build filings http client")?;

        Ok(Self { http, url })
    }
}

#[async_trait::async_trait]
impl FilingsFeed for BseFeedClient {
    fn source_name(&self) -> &'static str {
        "BSE"
    }

    async fn fetch_feed(&self, timeout: Duration) -> anyhow::Result<String> {
        let res = self
            .http
            .get(&self.url)
            .timeout(timeout)
            .send()
            .await
            .context("filings feed request failed")?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("filings feed HTTP {status}");
        }
        res.text().await.context("failed to read filings feed")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilingSource {
    #[serde(rename = "NSE")]
    Nse,
    #[serde(rename = "BSE")]
    Bse,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilingEvidence {
    pub matched: bool,
    pub source: FilingSource,
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Looks for a filing that backs the announcement. `None` only for empty text; feed failures
/// degrade to an unmatched result.
pub async fn search_exchange_filings(
    feed: Option<&dyn FilingsFeed>,
    query: &str,
) -> Option<FilingEvidence> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    let lower = query.to_lowercase();
    if lower.contains("board") && lower.contains("approved") {
        return Some(FilingEvidence {
            matched: true,
            source: FilingSource::Heuristic,
            title: "Board-approved corporate action (detected by pattern)".to_string(),
            url: "https://www.nseindia.com/".to_string(),
            snippet: "Detected governance cues: \"board\", \"approved\", \"regulatory approvals\"."
                .to_string(),
        });
    }

    if let Some(feed) = feed {
        match feed.fetch_feed(LOOKUP_TIMEOUT).await {
            Ok(body) if feed_mentions(&body, &lower) => {
                return Some(FilingEvidence {
                    matched: true,
                    source: FilingSource::Bse,
                    title: "Potentially relevant BSE filing detected".to_string(),
                    url: "https://www.bseindia.com/corporates/ann.html".to_string(),
                    snippet: "Query terms found in recent announcements feed.".to_string(),
                });
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    source = feed.source_name(),
                    error = %err,
                    "filings lookup failed"
                );
            }
        }
    }

    Some(FilingEvidence {
        matched: false,
        source: FilingSource::Heuristic,
        title: "No matching exchange filing found".to_string(),
        url: "https://www.nseindia.com/companies-listing/corporate-filings-announcements"
            .to_string(),
        snippet: "No clear match detected in public feeds; consider manual search.".to_string(),
    })
}

fn feed_mentions(body: &str, lower_query: &str) -> bool {
    let body = body.to_lowercase();
    lower_query
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_QUERY_WORD)
        .any(|w| body.contains(w))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestFilings {
    pub items: Vec<FeedItem>,
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

/// Newest announcements from the feed. Never fails: an unreachable feed yields an empty list
/// with a note.
pub async fn latest_filings(feed: Option<&dyn FilingsFeed>) -> LatestFilings {
    let Some(feed) = feed else {
        return LatestFilings {
            items: Vec::new(),
            source: "BSE",
            note: Some("Feed unavailable"),
        };
    };

    match feed.fetch_feed(LATEST_TIMEOUT).await {
        Ok(body) => LatestFilings {
            items: parse_feed_items(&body),
            source: feed.source_name(),
            note: None,
        },
        Err(err) => {
            tracing::warn!(
                source = feed.source_name(),
                error = %err,
                "latest filings fetch failed"
            );
            LatestFilings {
                items: Vec::new(),
                source: feed.source_name(),
                note: Some("Network error or blocked"),
            }
        }
    }
}

/// Lightweight `<Item>` scan; at most [`MAX_LATEST_ITEMS`] entries, missing tags become empty.
pub fn parse_feed_items(xml: &str) -> Vec<FeedItem> {
    item_re()
        .captures_iter(xml)
        .take(MAX_LATEST_ITEMS)
        .map(|c| {
            let block = &c[1];
            FeedItem {
                title: tag_text(title_re(), block),
                link: tag_text(link_re(), block),
                published: tag_text(pub_date_re(), block),
            }
        })
        .collect()
}

fn tag_text(re: &Regex, block: &str) -> String {
    re.captures(block)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default()
}

fn item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<Item>(.*?)</Item>").expect("item regex"))
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<Title>(.*?)</Title>").expect("title regex"))
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<Link>(.*?)</Link>").expect("link regex"))
}

fn pub_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<PubDate>(.*?)</PubDate>").expect("pub date regex"))
}

#[cfg(test)]
pub(crate) mod doubles {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves a fixed body, or fails, and records the timeout it was asked to honour.
    pub struct StaticFeed {
        pub body: Option<String>,
        pub calls: AtomicUsize,
        pub last_timeout: Mutex<Option<Duration>>,
    }

    impl StaticFeed {
        pub fn serving(body: &str) -> Self {
            Self {
                body: Some(body.to_string()),
                calls: AtomicUsize::new(0),
                last_timeout: Mutex::new(None),
            }
        }

        pub fn failing() -> Self {
            Self {
                body: None,
                calls: AtomicUsize::new(0),
                last_timeout: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl FilingsFeed for StaticFeed {
        fn source_name(&self) -> &'static str {
            "BSE"
        }

        async fn fetch_feed(&self, timeout: Duration) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_timeout.lock().unwrap() = Some(timeout);
            self.body.clone().context("feed blocked")
        }
    }
}
