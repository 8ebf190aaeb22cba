// src/config.rs
//! Seed configuration: the category and source tables the store boots with.
//! Loaded from TOML or JSON, with built-in defaults when no file is present.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{Category, Source};

const ENV_PATH: &str = "NEWSVIBE_SOURCES_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub sources: Vec<SeedSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub category_hint: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub min_score: u32,
}

fn default_weight() -> f32 {
    1.0
}

impl SeedConfig {
    /// Assign ids and produce the store-ready tables.
    pub fn into_tables(self) -> (Vec<Category>, Vec<Source>) {
        let categories = self
            .categories
            .into_iter()
            .enumerate()
            .map(|(i, c)| Category {
                id: i as u64 + 1,
                name: c.name,
                description: c.description,
            })
            .collect();
        let sources = self
            .sources
            .into_iter()
            .enumerate()
            .map(|(i, s)| Source {
                id: i as u64 + 1,
                name: s.name,
                url: s.url,
                category_hint: s.category_hint,
                weight: s.weight,
                min_score: s.min_score,
            })
            .collect();
        (categories, sources)
    }
}

/// Load seed config from an explicit path. Supports TOML or JSON.
pub fn load_seed_from(path: &Path) -> Result<SeedConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading seed config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("parsing JSON seed config {}", path.display())),
        _ => toml::from_str(&content)
            .with_context(|| format!("parsing TOML seed config {}", path.display())),
    }
}

/// Load seed config using env var + fallbacks:
/// 1) $NEWSVIBE_SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) built-in defaults
pub fn load_seed_default() -> Result<SeedConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_seed_from(&pb);
        }
        return Err(anyhow!("NEWSVIBE_SOURCES_PATH points to non-existent path"));
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_seed_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_seed_from(&json_p);
    }
    Ok(default_seed())
}

/// Built-in seed set: the categories and feed list the dashboard started
/// with. Replaced wholesale by any seed file.
pub fn default_seed() -> SeedConfig {
    let categories = vec![
        seed_cat("Robotics", "News about robotics and automation"),
        seed_cat("AI", "Artificial intelligence and machine learning"),
        seed_cat("US Politics", "United States political news"),
    ];
    let sources = vec![
        seed_src("Hacker News - Frontpage (HN RSS)", "https://hnrss.org/frontpage", "tech", 1.0, 100),
        seed_src("Hacker News - Newest (HN RSS)", "https://hnrss.org/newest", "tech", 0.5, 200),
        seed_src("Reddit r/MachineLearning", "https://www.reddit.com/r/MachineLearning/.rss", "tech/ai", 0.8, 50),
        seed_src("Reddit r/artificial", "https://www.reddit.com/r/artificial/.rss", "tech/ai", 0.8, 50),
        seed_src("Reddit r/robotics", "https://www.reddit.com/r/robotics/.rss", "tech/robotics", 0.8, 30),
        seed_src("Reddit r/Singularity", "https://www.reddit.com/r/Singularity/.rss", "tech/ai/futures", 0.6, 30),
        seed_src("Reddit r/math", "https://www.reddit.com/r/math/.rss", "math", 0.5, 30),
        seed_src("Reddit r/science", "https://www.reddit.com/r/science/.rss", "science", 0.6, 100),
        seed_src("arXiv CS.AI (Artificial Intelligence)", "https://export.arxiv.org/rss/cs.AI", "research/ai", 0.9, 0),
        seed_src("arXiv CS.RO (Robotics)", "https://export.arxiv.org/rss/cs.RO", "research/robotics", 0.9, 0),
        seed_src("New York Times - HomePage", "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml", "news", 1.0, 0),
        seed_src("New York Times - Technology", "https://rss.nytimes.com/services/xml/rss/nyt/Technology.xml", "tech", 0.9, 0),
        seed_src(
            "Reuters Politics (via Google News)",
            "https://news.google.com/rss/search?q=site:reuters.com+section:politics&ceid=US:en&hl=en-US&gl=US",
            "us politics", 1.0, 0,
        ),
        seed_src(
            "Reuters Technology (via Google News)",
            "https://news.google.com/rss/search?q=site:reuters.com+section:technology&ceid=US:en&hl=en-US&gl=US",
            "tech", 1.0, 0,
        ),
        seed_src("Politico - US Politics (RSS)", "http://www.politico.com/rss/politicopicks.xml", "us politics", 0.9, 0),
        seed_src("Axios - Politics", "https://api.axios.com/feed/", "us politics", 0.8, 0),
    ];
    SeedConfig {
        categories,
        sources,
    }
}

fn seed_cat(name: &str, description: &str) -> SeedCategory {
    SeedCategory {
        name: name.to_string(),
        description: description.to_string(),
    }
}

fn seed_src(name: &str, url: &str, hint: &str, weight: f32, min_score: u32) -> SeedSource {
    SeedSource {
        name: name.to_string(),
        url: url.to_string(),
        category_hint: Some(hint.to_string()),
        weight,
        min_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn toml_and_json_seed_files_parse() {
        let toml = r#"
            [[categories]]
            name = "AI"

            [[sources]]
            name = "HN"
            url = "https://hnrss.org/frontpage"
            category_hint = "tech"
            min_score = 100
        "#;
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("sources.toml");
        fs::write(&p, toml).unwrap();
        let seed = load_seed_from(&p).unwrap();
        assert_eq!(seed.categories.len(), 1);
        assert_eq!(seed.sources[0].min_score, 100);
        assert_eq!(seed.sources[0].weight, 1.0);

        let json = r#"{"sources": [{"name": "R", "url": "https://www.reddit.com/r/math/.rss"}]}"#;
        let p2 = tmp.path().join("sources.json");
        fs::write(&p2, json).unwrap();
        let seed2 = load_seed_from(&p2).unwrap();
        assert!(seed2.categories.is_empty());
        assert_eq!(seed2.sources[0].name, "R");
    }

    #[serial_test::serial]
    #[test]
    fn env_path_takes_precedence() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("seed.json");
        fs::write(&p, r#"{"categories": [{"name": "X"}], "sources": []}"#).unwrap();
        env::set_var(ENV_PATH, p.display().to_string());
        let seed = load_seed_default().unwrap();
        assert_eq!(seed.categories[0].name, "X");
        env::remove_var(ENV_PATH);
    }

    #[test]
    fn default_seed_assigns_ids() {
        let (cats, sources) = default_seed().into_tables();
        assert_eq!(cats.len(), 3);
        assert_eq!(sources.len(), 16);
        assert_eq!(cats[0].id, 1);
        assert_eq!(sources[15].id, 16);
    }
}
