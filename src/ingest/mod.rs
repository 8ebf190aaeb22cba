// src/ingest/mod.rs
//! Pipeline orchestration: fetch from every configured source, classify each
//! candidate, and gate it through dedup + persistence. One call is one run;
//! every error class degrades to a logged skip, never a failed run.

pub mod fetch;
pub mod normalize;
pub mod score;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::classify::{self, ClassifierClient, Tier};
use crate::ingest::fetch::ArticleFetcher;
use crate::store::{sources_by_id, ArticleStore, StoreError};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_fetched_total", "Articles fetched across all sources.");
        describe_counter!("ingest_saved_total", "Articles persisted.");
        describe_counter!(
            "ingest_duplicates_total",
            "Candidates skipped as already persisted."
        );
        describe_counter!(
            "ingest_no_category_total",
            "Candidates dropped because no tier produced a category."
        );
        describe_counter!("ingest_source_errors_total", "Source fetch/parse errors.");
        describe_counter!("ingest_classifier_calls_total", "Text-classifier calls made.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Aggregated result of one ingestion pass.
///
/// Invariant: `saved + skipped_duplicate + skipped_invalid +
/// skipped_no_category == total_fetched`.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    pub total_fetched: usize,
    pub saved: usize,
    pub skipped_duplicate: usize,
    /// Empty title/url, unknown source, or a non-duplicate store error.
    pub skipped_invalid: usize,
    pub skipped_no_category: usize,
    pub classified_by_hint: usize,
    pub classified_by_model: usize,
    pub classifier_calls: usize,
    /// Fetched counts per source, in configuration order.
    pub per_source: Vec<(String, usize)>,
}

impl RunReport {
    pub fn skipped(&self) -> usize {
        self.skipped_duplicate + self.skipped_invalid + self.skipped_no_category
    }
}

/// Run one full ingestion pass: every configured source, fetch → classify →
/// gate. Safe to invoke repeatedly; already-persisted URLs are skipped.
pub async fn run_once(
    store: &dyn ArticleStore,
    fetcher: &dyn ArticleFetcher,
    classifier: &dyn ClassifierClient,
) -> RunReport {
    ensure_metrics_described();
    let mut report = RunReport::default();

    let sources = store.list_sources();
    tracing::info!(sources = sources.len(), "starting ingestion pass");

    // Fetch stage. Failing sources contribute zero articles, never abort.
    let mut candidates = Vec::new();
    for source in &sources {
        match fetcher.fetch(source).await {
            Ok(articles) => {
                tracing::debug!(source = %source.name, fetched = articles.len(), "source fetched");
                report.per_source.push((source.name.clone(), articles.len()));
                candidates.extend(articles);
            }
            Err(e) => {
                tracing::warn!(source = %source.name, error = ?e, "source fetch failed");
                counter!("ingest_source_errors_total").increment(1);
                report.per_source.push((source.name.clone(), 0));
            }
        }
    }
    report.total_fetched = candidates.len();
    counter!("ingest_fetched_total").increment(candidates.len() as u64);

    let by_id = sources_by_id(&sources);
    let category_names: Vec<String> = store
        .list_categories()
        .into_iter()
        .map(|c| c.name)
        .collect();

    for article in candidates {
        // Re-validate defensively; fetchers already drop empty titles.
        let title = article.title.trim();
        let url = article.url.trim();
        if title.is_empty() || url.is_empty() {
            report.skipped_invalid += 1;
            continue;
        }

        // Cheap pre-check so a known duplicate never costs a classifier
        // call. The insert below re-checks under the store's lock.
        if store.exists_article_by_url(url) {
            report.skipped_duplicate += 1;
            counter!("ingest_duplicates_total").increment(1);
            continue;
        }

        let Some(source) = by_id.get(&article.source_id) else {
            tracing::warn!(url, source_id = article.source_id, "unknown source id");
            report.skipped_invalid += 1;
            continue;
        };

        let (decided, called) =
            classify::resolve_category(source, title, &category_names, classifier).await;
        if called {
            report.classifier_calls += 1;
            counter!("ingest_classifier_calls_total").increment(1);
        }
        let Some((category, tier)) = decided else {
            report.skipped_no_category += 1;
            counter!("ingest_no_category_total").increment(1);
            continue;
        };
        match tier {
            Tier::Hint => report.classified_by_hint += 1,
            Tier::Model => report.classified_by_model += 1,
        }

        let record = crate::model::NewArticle {
            title: title.to_string(),
            url: url.to_string(),
            source: source.name.clone(),
            source_id: source.id,
            category,
            summary: article.summary.clone(),
            published_at: article.published_at,
        };
        match store.insert_article(record) {
            Ok(_) => {
                report.saved += 1;
                counter!("ingest_saved_total").increment(1);
            }
            Err(StoreError::DuplicateUrl) => {
                // Lost the race to a concurrent writer; routine, not an error.
                tracing::debug!(url, "duplicate at write time");
                report.skipped_duplicate += 1;
                counter!("ingest_duplicates_total").increment(1);
            }
            Err(StoreError::Other(e)) => {
                tracing::warn!(url, error = ?e, "persist failed; continuing");
                report.skipped_invalid += 1;
            }
        }
    }

    if let Err(e) = store.commit() {
        tracing::warn!(error = ?e, "store commit failed");
    }
    gauge!("ingest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

    tracing::info!(
        total_fetched = report.total_fetched,
        saved = report.saved,
        skipped_duplicate = report.skipped_duplicate,
        skipped_invalid = report.skipped_invalid,
        skipped_no_category = report.skipped_no_category,
        classified_by_hint = report.classified_by_hint,
        classified_by_model = report.classified_by_model,
        classifier_calls = report.classifier_calls,
        "ingestion pass complete"
    );
    report
}
