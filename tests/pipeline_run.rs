// tests/pipeline_run.rs
//! End-to-end runs of the ingestion pass against an in-memory store, a
//! fixture fetcher, and mock classifiers.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use newsvibe::classify::client::ClassifierClient;
use newsvibe::ingest::fetch::ArticleFetcher;
use newsvibe::ingest::run_once;
use newsvibe::model::{CanonicalArticle, Category, Source};
use newsvibe::store::MemStore;

struct FixtureFetcher {
    by_source: HashMap<u64, Vec<CanonicalArticle>>,
    failing: Vec<u64>,
}

#[async_trait]
impl ArticleFetcher for FixtureFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<CanonicalArticle>> {
        if self.failing.contains(&source.id) {
            return Err(anyhow!("simulated network failure"));
        }
        Ok(self.by_source.get(&source.id).cloned().unwrap_or_default())
    }
}

/// Mock classifier that counts calls, so tests can assert the hint tier
/// short-circuited.
struct CountingClassifier {
    answer: Option<String>,
    calls: AtomicUsize,
}

impl CountingClassifier {
    fn new(answer: Option<&str>) -> Self {
        Self {
            answer: answer.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ClassifierClient for CountingClassifier {
    fn classify<'a>(
        &'a self,
        _headline: &'a str,
        _category_names: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let out = self.answer.clone();
        Box::pin(async move { out })
    }
    fn provider_name(&self) -> &'static str {
        "counting-mock"
    }
}

fn source(id: u64, name: &str, hint: Option<&str>) -> Source {
    Source {
        id,
        name: name.into(),
        url: format!("https://example.test/{id}/feed"),
        category_hint: hint.map(str::to_string),
        weight: 1.0,
        min_score: 0,
    }
}

fn article(source_id: u64, title: &str, url: &str) -> CanonicalArticle {
    CanonicalArticle {
        title: title.into(),
        url: url.into(),
        summary: "summary".into(),
        published_at: Some(1_700_000_000),
        score: 0,
        source_id,
    }
}

fn seeded_store(sources: Vec<Source>) -> MemStore {
    let store = MemStore::new();
    store.set_categories(vec![
        Category {
            id: 1,
            name: "Robotics".into(),
            description: String::new(),
        },
        Category {
            id: 2,
            name: "AI".into(),
            description: String::new(),
        },
    ]);
    store.set_sources(sources);
    store
}

#[tokio::test]
async fn hint_tier_saves_without_calling_classifier() {
    let store = seeded_store(vec![source(1, "r/robotics", Some("tech/robotics"))]);
    let fetcher = FixtureFetcher {
        by_source: HashMap::from([(
            1,
            vec![article(1, "New arm design", "https://example.test/a")],
        )]),
        failing: vec![],
    };
    let classifier = CountingClassifier::new(Some("AI"));

    let report = run_once(&store, &fetcher, &classifier).await;
    assert_eq!(report.saved, 1);
    assert_eq!(report.classified_by_hint, 1);
    assert_eq!(report.classified_by_model, 0);
    assert_eq!(classifier.calls(), 0);

    let saved = store.articles();
    assert_eq!(saved[0].category, "Robotics");
    assert_eq!(saved[0].source, "r/robotics");
    assert!(!saved[0].is_saved);
}

#[tokio::test]
async fn generic_hint_falls_through_to_model_tier() {
    let store = seeded_store(vec![source(1, "HN", Some("tech"))]);
    let fetcher = FixtureFetcher {
        by_source: HashMap::from([(1, vec![article(1, "GPU news", "https://example.test/g")])]),
        failing: vec![],
    };
    let classifier = CountingClassifier::new(Some("AI"));

    let report = run_once(&store, &fetcher, &classifier).await;
    assert_eq!(report.saved, 1);
    assert_eq!(report.classified_by_model, 1);
    assert_eq!(report.classifier_calls, 1);
    assert_eq!(classifier.calls(), 1);
    assert_eq!(store.articles()[0].category, "AI");
}

#[tokio::test]
async fn no_category_means_not_persisted() {
    let store = seeded_store(vec![source(1, "HN", Some("tech"))]);
    let fetcher = FixtureFetcher {
        by_source: HashMap::from([(
            1,
            vec![article(1, "Sports news", "https://example.test/s")],
        )]),
        failing: vec![],
    };
    let classifier = CountingClassifier::new(Some("OTHER"));

    let report = run_once(&store, &fetcher, &classifier).await;
    assert_eq!(report.saved, 0);
    assert_eq!(report.skipped_no_category, 1);
    assert!(store.articles().is_empty());
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let store = seeded_store(vec![source(1, "r/robotics", Some("tech/robotics"))]);
    let fetcher = FixtureFetcher {
        by_source: HashMap::from([(
            1,
            vec![
                article(1, "A", "https://example.test/a"),
                article(1, "B", "https://example.test/b"),
            ],
        )]),
        failing: vec![],
    };
    let classifier = CountingClassifier::new(None);

    let first = run_once(&store, &fetcher, &classifier).await;
    assert_eq!(first.saved, 2);

    let second = run_once(&store, &fetcher, &classifier).await;
    assert_eq!(second.saved, 0);
    assert_eq!(second.skipped_duplicate, 2);
    // Pre-check catches the duplicates before any classifier call.
    assert_eq!(classifier.calls(), 0);
    assert_eq!(store.articles().len(), 2);
}

#[tokio::test]
async fn failing_source_is_isolated() {
    let store = seeded_store(vec![
        source(1, "Broken", Some("tech/robotics")),
        source(2, "Healthy", Some("tech/robotics")),
    ]);
    let fetcher = FixtureFetcher {
        by_source: HashMap::from([(2, vec![article(2, "Ok", "https://example.test/ok")])]),
        failing: vec![1],
    };
    let classifier = CountingClassifier::new(None);

    let report = run_once(&store, &fetcher, &classifier).await;
    assert_eq!(report.saved, 1);
    assert_eq!(
        report.per_source,
        vec![("Broken".to_string(), 0), ("Healthy".to_string(), 1)]
    );
}

#[tokio::test]
async fn zero_sources_is_a_legitimate_empty_run() {
    let store = seeded_store(vec![]);
    let fetcher = FixtureFetcher {
        by_source: HashMap::new(),
        failing: vec![],
    };
    let classifier = CountingClassifier::new(None);

    let report = run_once(&store, &fetcher, &classifier).await;
    assert_eq!(report.total_fetched, 0);
    assert_eq!(report.saved, 0);
    assert!(report.per_source.is_empty());
}

#[tokio::test]
async fn report_counts_are_consistent() {
    let store = seeded_store(vec![
        source(1, "Hinted", Some("tech/robotics")),
        source(2, "Unhinted", Some("tech")),
    ]);
    // One hint save, one model reject, one invalid (empty url), one
    // duplicate within the batch.
    let fetcher = FixtureFetcher {
        by_source: HashMap::from([
            (
                1,
                vec![
                    article(1, "Saved", "https://example.test/1"),
                    article(1, "No url", ""),
                ],
            ),
            (
                2,
                vec![
                    article(2, "Rejected", "https://example.test/2"),
                    article(2, "Dup", "https://example.test/1"),
                ],
            ),
        ]),
        failing: vec![],
    };
    let classifier = CountingClassifier::new(Some("OTHER"));

    let report = run_once(&store, &fetcher, &classifier).await;
    assert_eq!(report.total_fetched, 4);
    assert_eq!(report.saved, 1);
    assert_eq!(report.skipped_invalid, 1);
    assert_eq!(report.skipped_no_category, 1);
    assert_eq!(report.skipped_duplicate, 1);
    assert_eq!(
        report.saved + report.skipped(),
        report.total_fetched,
        "count identity must hold"
    );
}
