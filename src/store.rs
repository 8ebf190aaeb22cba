// src/store.rs
//! Narrow read/write contract the pipeline consumes, plus the two concrete
//! stores: an in-memory one for tests and a JSON-file one for the binary.
//!
//! URL uniqueness is enforced *inside* the store, under its lock. That makes
//! the insert the single source of truth for dedup; the orchestrator's
//! exists-check is only an optimization to skip classifier calls.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;

use crate::model::{Article, Category, NewArticle, Source};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("article url already persisted")]
    DuplicateUrl,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Store contract consumed by the pipeline. Sources and categories are
/// administered externally; the pipeline only reads them.
pub trait ArticleStore: Send + Sync {
    fn list_sources(&self) -> Vec<Source>;
    fn list_categories(&self) -> Vec<Category>;
    fn exists_article_by_url(&self, url: &str) -> bool;
    fn insert_article(&self, article: NewArticle) -> Result<u64, StoreError>;
    /// Flush writes accumulated during a run. No-op for in-memory stores.
    fn commit(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
struct State {
    sources: Vec<Source>,
    categories: Vec<Category>,
    articles: Vec<Article>,
    urls: HashSet<String>,
    next_article_id: u64,
}

impl State {
    fn insert(&mut self, article: NewArticle) -> Result<u64, StoreError> {
        if self.urls.contains(&article.url) {
            return Err(StoreError::DuplicateUrl);
        }
        self.next_article_id += 1;
        let id = self.next_article_id;
        self.urls.insert(article.url.clone());
        self.articles
            .push(Article::from_new(id, article, chrono::Utc::now()));
        Ok(id)
    }
}

/// In-memory store. Backs tests and serves as the shared core of `JsonStore`.
#[derive(Debug, Default)]
pub struct MemStore {
    inner: Mutex<State>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace sources/categories wholesale (seed or admin path, not the
    /// pipeline's).
    pub fn set_sources(&self, sources: Vec<Source>) {
        self.inner.lock().expect("store mutex poisoned").sources = sources;
    }

    pub fn set_categories(&self, categories: Vec<Category>) {
        self.inner.lock().expect("store mutex poisoned").categories = categories;
    }

    pub fn articles(&self) -> Vec<Article> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .articles
            .clone()
    }

    fn load_articles(&self, articles: Vec<Article>) {
        let mut g = self.inner.lock().expect("store mutex poisoned");
        g.urls = articles.iter().map(|a| a.url.clone()).collect();
        g.next_article_id = articles.iter().map(|a| a.id).max().unwrap_or(0);
        g.articles = articles;
    }
}

impl ArticleStore for MemStore {
    fn list_sources(&self) -> Vec<Source> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .sources
            .clone()
    }

    fn list_categories(&self) -> Vec<Category> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .categories
            .clone()
    }

    fn exists_article_by_url(&self, url: &str) -> bool {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .urls
            .contains(url)
    }

    fn insert_article(&self, article: NewArticle) -> Result<u64, StoreError> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .insert(article)
    }

    fn commit(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// File-backed store: the article table lives in one JSON file, rewritten
/// atomically (tmp + rename) on commit. Articles reload on open; sources and
/// categories are re-seeded from config each boot.
pub struct JsonStore {
    mem: MemStore,
    path: PathBuf,
}

impl JsonStore {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = Self {
            mem: MemStore::new(),
            path: path.clone(),
        };
        if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("reading article store {}", path.display()))?;
            let articles: Vec<Article> = serde_json::from_str(&data)
                .with_context(|| format!("parsing article store {}", path.display()))?;
            store.mem.load_articles(articles);
        }
        Ok(store)
    }

    pub fn set_sources(&self, sources: Vec<Source>) {
        self.mem.set_sources(sources);
    }

    pub fn set_categories(&self, categories: Vec<Category>) {
        self.mem.set_categories(categories);
    }

    pub fn articles(&self) -> Vec<Article> {
        self.mem.articles()
    }
}

impl ArticleStore for JsonStore {
    fn list_sources(&self) -> Vec<Source> {
        self.mem.list_sources()
    }

    fn list_categories(&self) -> Vec<Category> {
        self.mem.list_categories()
    }

    fn exists_article_by_url(&self, url: &str) -> bool {
        self.mem.exists_article_by_url(url)
    }

    fn insert_article(&self, article: NewArticle) -> Result<u64, StoreError> {
        self.mem.insert_article(article)
    }

    fn commit(&self) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating store dir {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.mem.articles())
            .context("serializing article store")?;
        let tmp = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(json.as_bytes())
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming into {}", self.path.display()))?;
        Ok(())
    }
}

/// Lookup helper used by the orchestrator to resolve an article's owning
/// source without re-querying the store per candidate.
pub fn sources_by_id(sources: &[Source]) -> HashMap<u64, Source> {
    sources.iter().map(|s| (s.id, s.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(url: &str) -> NewArticle {
        NewArticle {
            title: "T".into(),
            url: url.into(),
            source: "S".into(),
            source_id: 1,
            category: "AI".into(),
            summary: String::new(),
            published_at: None,
        }
    }

    #[test]
    fn duplicate_url_is_rejected() {
        let store = MemStore::new();
        assert!(store.insert_article(sample("https://a.test/x")).is_ok());
        let err = store.insert_article(sample("https://a.test/x")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUrl));
        assert!(store.exists_article_by_url("https://a.test/x"));
        assert!(!store.exists_article_by_url("https://a.test/y"));
    }

    #[test]
    fn ids_are_monotonic() {
        let store = MemStore::new();
        let a = store.insert_article(sample("https://a.test/1")).unwrap();
        let b = store.insert_article(sample("https://a.test/2")).unwrap();
        assert!(b > a);
    }
}
