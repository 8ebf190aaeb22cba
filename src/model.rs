// src/model.rs
//! Data shapes shared across the pipeline: configured sources, interest
//! categories, and the article record in its in-flight and persisted forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named interest bucket. Lifecycle is external to the pipeline; we only
/// read the current set at classification time. Names are unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A configured feed origin. The URL is the identity; read-only during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub id: u64,
    pub name: String,
    pub url: String,
    /// e.g. "tech/robotics", "us politics". Drives tier-1 classification.
    #[serde(default)]
    pub category_hint: Option<String>,
    /// Informational fetch weight; not applied to ranking yet.
    #[serde(default = "default_weight")]
    pub weight: f32,
    /// Entries scoring below this are dropped at fetch time. 0 disables.
    #[serde(default)]
    pub min_score: u32,
}

fn default_weight() -> f32 {
    1.0
}

/// The normalized in-memory shape every provider family converges on.
/// Lives only between fetch and the persistence decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalArticle {
    pub title: String,
    pub url: String,
    pub summary: String,
    /// Unix seconds. Best-effort; absent when the feed date is missing or
    /// unparseable.
    pub published_at: Option<u64>,
    pub score: u32,
    pub source_id: u64,
}

/// What the gate hands to the store. The store assigns the row id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub url: String,
    /// Legacy plain-text source name, mirrored alongside `source_id`.
    pub source: String,
    pub source_id: u64,
    pub category: String,
    pub summary: String,
    pub published_at: Option<u64>,
}

/// The durable record. Never mutated or deleted by the pipeline after
/// creation; `is_saved` belongs to the user-facing layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub source: String,
    pub source_id: u64,
    pub category: String,
    pub summary: String,
    #[serde(default)]
    pub is_saved: bool,
    pub published_at: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl Article {
    pub fn from_new(id: u64, new: NewArticle, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            url: new.url,
            source: new.source,
            source_id: new.source_id,
            category: new.category,
            summary: new.summary,
            is_saved: false,
            published_at: new.published_at,
            created_at,
        }
    }
}
