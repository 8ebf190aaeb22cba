// src/ingest/fetch.rs
//! Per-source fetching. Two strategies picked off the source URL: Reddit
//! sources go through the JSON listing endpoint, everything else is parsed
//! as RSS/Atom. Parsing is split out of the HTTP path so fixtures can drive
//! it in tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::normalize::{
    normalize_feed_entry, normalize_reddit_post, FeedEntry, RedditPost, SourceFamily,
};
use crate::model::{CanonicalArticle, Source};

/// Some providers block default client identifiers; present a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One source in, canonical articles out. Each call re-fetches from the
/// network; the sequence is finite and not restartable.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch(&self, source: &Source) -> Result<Vec<CanonicalArticle>>;
}

pub struct HttpFetcher {
    http: reqwest::Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self { http }
    }

    async fn fetch_reddit(&self, source: &Source) -> Result<Vec<CanonicalArticle>> {
        let json_url = reddit_json_url(&source.url);
        let body = self
            .http
            .get(&json_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("GET {json_url}"))?
            .text()
            .await
            .context("reading reddit listing body")?;
        reddit_articles_from_json(source, &body)
    }

    async fn fetch_feed(&self, source: &Source) -> Result<Vec<CanonicalArticle>> {
        let body = self
            .http
            .get(&source.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("GET {}", source.url))?
            .text()
            .await
            .context("reading feed body")?;

        // A malformed feed is routine; log it and contribute nothing rather
        // than failing the source.
        match parse_feed(&body) {
            Ok(entries) => Ok(feed_articles_from_entries(source, &entries)),
            Err(e) => {
                tracing::warn!(source = %source.name, error = ?e, "feed parse error");
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl ArticleFetcher for HttpFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<CanonicalArticle>> {
        match SourceFamily::detect(&source.url) {
            SourceFamily::Reddit => self.fetch_reddit(source).await,
            _ => self.fetch_feed(source).await,
        }
    }
}

/// Rewrite a configured RSS-style Reddit URL into the JSON listing endpoint:
/// strip any ".rss" suffix, ensure a ".json" suffix.
pub fn reddit_json_url(url: &str) -> String {
    let mut u = url.replace("/.rss", "").replace(".rss", "");
    if !u.ends_with(".json") {
        if u.ends_with('/') {
            u.push_str(".json");
        } else {
            u.push_str("/.json");
        }
    }
    u
}

// ---- Reddit listing shape: {data: {children: [{data: {...}}]}} ----

#[derive(Debug, Deserialize)]
struct RedditListing {
    data: RedditListingData,
}

#[derive(Debug, Deserialize)]
struct RedditListingData {
    #[serde(default)]
    children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
struct RedditChild {
    #[serde(default)]
    data: RedditPost,
}

/// Parse a Reddit listing body and normalize its posts, applying the
/// source's min-score filter (0 disables).
pub fn reddit_articles_from_json(source: &Source, body: &str) -> Result<Vec<CanonicalArticle>> {
    let listing: RedditListing =
        serde_json::from_str(body).context("parsing reddit json listing")?;

    let mut out = Vec::with_capacity(listing.data.children.len());
    for child in listing.data.children {
        let Some(article) = normalize_reddit_post(&child.data, source) else {
            continue;
        };
        if source.min_score > 0 && article.score < source.min_score {
            continue;
        }
        out.push(article);
    }
    Ok(out)
}

// ---- RSS shape ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    comments: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

// ---- Atom shape ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    published: Option<String>,
    updated: Option<String>,
}

/// Atom text constructs carry a `type` attribute next to the text node.
#[derive(Debug, Default, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Parse a feed body as RSS first, then Atom. Entity references like
/// `&nbsp;` are scrubbed beforehand; they are legal in HTML but not in XML.
pub fn parse_feed(body: &str) -> Result<Vec<FeedEntry>> {
    let xml = scrub_html_entities_for_xml(body);

    if let Ok(rss) = from_str::<Rss>(&xml) {
        return Ok(rss.channel.items.into_iter().map(rss_item_to_entry).collect());
    }

    let atom: AtomFeed = from_str(&xml).context("parsing feed as rss/atom")?;
    Ok(atom.entries.into_iter().map(atom_entry_to_entry).collect())
}

fn rss_item_to_entry(item: RssItem) -> FeedEntry {
    FeedEntry {
        title: item.title.unwrap_or_default(),
        link: item.link.unwrap_or_default(),
        comments_link: item.comments,
        summary: None,
        description: item.description,
        content: None,
        published_raw: item.pub_date,
    }
}

fn atom_entry_to_entry(entry: AtomEntry) -> FeedEntry {
    // Prefer rel="alternate" (or an unmarked link) over self/edit links.
    let link = entry
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or(entry.links.first())
        .and_then(|l| l.href.clone())
        .unwrap_or_default();

    FeedEntry {
        title: entry.title.map(|t| t.value).unwrap_or_default(),
        link,
        comments_link: None,
        summary: entry.summary.map(|t| t.value),
        description: None,
        content: entry.content.map(|t| t.value),
        published_raw: entry.published.or(entry.updated),
    }
}

/// Normalize parsed feed entries under the source's family rules and apply
/// its min-score filter. Entries with empty titles are silently dropped.
pub fn feed_articles_from_entries(source: &Source, entries: &[FeedEntry]) -> Vec<CanonicalArticle> {
    let family = SourceFamily::detect(&source.url);
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(article) = normalize_feed_entry(family, entry, source) else {
            continue;
        };
        if source.min_score > 0 && article.score < source.min_score {
            continue;
        }
        out.push(article);
    }
    out
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
