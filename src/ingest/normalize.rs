// src/ingest/normalize.rs
//! Per-family entry normalization: every provider shape converges on
//! `CanonicalArticle` here. The family is a closed set keyed off the source
//! URL; each variant owns its extraction quirks.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;

use crate::ingest::score::extract_score_from_text;
use crate::model::{CanonicalArticle, Source};

/// Maximum summary length for generic feeds, in characters.
const SUMMARY_MAX_CHARS: usize = 500;
const SUMMARY_ELLIPSIS: &str = "...";

/// Provider families with distinct parsing quirks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFamily {
    ArXiv,
    HackerNews,
    GoogleNews,
    Reddit,
    Generic,
}

impl SourceFamily {
    pub fn detect(url: &str) -> Self {
        let u = url.to_ascii_lowercase();
        if u.contains("reddit.com") {
            Self::Reddit
        } else if u.contains("arxiv.org") {
            Self::ArXiv
        } else if u.contains("hnrss.org") || u.contains("news.ycombinator.com") {
            Self::HackerNews
        } else if u.contains("news.google.com") {
            Self::GoogleNews
        } else {
            Self::Generic
        }
    }
}

/// Provider-shaped feed entry after XML parsing, before normalization.
/// Field presence varies per provider; absent means empty here, never a
/// crash downstream.
#[derive(Debug, Clone, Default)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// HN RSS carries the discussion URL in a separate `<comments>` element.
    pub comments_link: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    /// Raw date string as published by the feed (RFC2822 or RFC3339).
    pub published_raw: Option<String>,
}

/// One post out of a Reddit JSON listing (`data.children[].data`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedditPost {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub ups: i64,
    #[serde(default)]
    pub created_utc: Option<f64>,
}

/// Decode entities, strip tags, collapse whitespace.
pub fn strip_html(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let out = re_tags.replace_all(&decoded, " ").to_string();

    collapse_whitespace(&out)
}

pub fn collapse_whitespace(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(s, " ").trim().to_string()
}

fn truncate_summary(s: &str) -> String {
    if s.chars().count() <= SUMMARY_MAX_CHARS {
        return s.to_string();
    }
    let mut out: String = s.chars().take(SUMMARY_MAX_CHARS).collect();
    out.push_str(SUMMARY_ELLIPSIS);
    out
}

/// Best-effort feed date parsing to unix seconds: RFC2822 (`pubDate`), then
/// RFC3339 (Atom `published`/`updated`).
pub fn parse_feed_timestamp(ts: &str) -> Option<u64> {
    use time::format_description::well_known::{Rfc2822, Rfc3339};
    use time::{OffsetDateTime, UtcOffset};

    // Feeds commonly use the obsolete "GMT"/"UT" zone names.
    let ts = ts.trim();
    let fixed;
    let ts = match ts.strip_suffix(" GMT").or_else(|| ts.strip_suffix(" UT")) {
        Some(head) => {
            fixed = format!("{head} +0000");
            fixed.as_str()
        }
        None => ts,
    };

    let parsed = OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()?;
    u64::try_from(parsed.to_offset(UtcOffset::UTC).unix_timestamp()).ok()
}

/// Normalize one feed entry under its family's rules. Returns `None` when
/// the post-trim title is empty; the entry is silently dropped by the caller.
pub fn normalize_feed_entry(
    family: SourceFamily,
    entry: &FeedEntry,
    source: &Source,
) -> Option<CanonicalArticle> {
    let mut title = collapse_whitespace(&entry.title);
    let mut url = entry.link.trim().to_string();
    let description = entry
        .summary
        .as_deref()
        .or(entry.description.as_deref())
        .or(entry.content.as_deref())
        .unwrap_or_default();

    let summary = match family {
        SourceFamily::ArXiv => {
            title = strip_arxiv_id(&title);
            description.trim().to_string()
        }
        SourceFamily::HackerNews => {
            // Surface the discussion thread rather than the story itself.
            if let Some(comments) = entry.comments_link.as_deref() {
                let comments = comments.trim();
                if !comments.is_empty() {
                    url = comments.to_string();
                }
            }
            let points = capture_number(description, hn_points_re());
            let comments = capture_number(description, hn_comments_re());
            format!("Points: {points} | Comments: {comments}")
        }
        SourceFamily::GoogleNews => {
            // Google News descriptions are markup-heavy and often collapse
            // to nothing useful; fall back to the publication date.
            let stripped = strip_html(description);
            if stripped.chars().count() < 10 {
                entry
                    .published_raw
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .unwrap_or(stripped)
            } else {
                stripped
            }
        }
        // Reddit sources never reach here; they are fetched as JSON.
        SourceFamily::Reddit | SourceFamily::Generic => truncate_summary(&strip_html(description)),
    };

    if title.is_empty() {
        return None;
    }

    let score = extract_score_from_text(&summary);
    Some(CanonicalArticle {
        title,
        url,
        summary,
        published_at: entry
            .published_raw
            .as_deref()
            .and_then(parse_feed_timestamp),
        score,
        source_id: source.id,
    })
}

/// Normalize one Reddit JSON post. `None` when the title is empty.
pub fn normalize_reddit_post(post: &RedditPost, source: &Source) -> Option<CanonicalArticle> {
    let title = collapse_whitespace(&post.title);
    if title.is_empty() {
        return None;
    }

    // Self-posts carry a relative permalink; external links use `url` as-is.
    let url = if !post.permalink.is_empty() && !post.url.starts_with("http") {
        format!("https://www.reddit.com{}", post.permalink)
    } else {
        post.url.trim().to_string()
    };

    // Negative vote counts clamp to zero; conversion failures on the epoch
    // yield an absent published time rather than dropping the entry.
    let published_at = post
        .created_utc
        .filter(|t| t.is_finite() && *t > 0.0)
        .and_then(|t| u64::try_from(t as i64).ok());

    Some(CanonicalArticle {
        title,
        url,
        summary: post.selftext.clone(),
        published_at,
        score: post.ups.max(0) as u32,
        source_id: source.id,
    })
}

fn strip_arxiv_id(title: &str) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"^arXiv:\s*\d{4}\.\d{4,5}(?:v\d+)?\s*").unwrap());
    re.replace(title, "").trim().to_string()
}

fn hn_points_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)points?:\s*(\d+)").unwrap())
}

fn hn_comments_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)#?\s*comments?:?\s*(\d+)").unwrap())
}

fn capture_number(text: &str, re: &Regex) -> u32 {
    re.captures(text)
        .and_then(|c| c[1].parse::<u32>().ok())
        .unwrap_or(0)
}
