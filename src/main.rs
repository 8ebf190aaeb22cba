//! newsvibe — Binary Entrypoint
//! Seeds the store, wires the fetcher and classifier, runs one ingestion
//! pass, and prints the run report as JSON.
//!
//! Scheduling is external: run this on demand or from a timer.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsvibe::classify::{build_client_from_config, load_classifier_config, ClassifierClient};
use newsvibe::config::load_seed_default;
use newsvibe::ingest::fetch::HttpFetcher;
use newsvibe::store::JsonStore;

const STORE_PATH: &str = "data/articles.json";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsvibe=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op elsewhere. Supplies OPENAI_API_KEY and
    // NEWSVIBE_SOURCES_PATH.
    let _ = dotenvy::dotenv();
    init_tracing();

    let seed = load_seed_default()?;
    let (categories, sources) = seed.into_tables();

    let store = JsonStore::open(STORE_PATH)?;
    store.set_categories(categories);
    store.set_sources(sources);

    let classifier = build_client_from_config(&load_classifier_config());
    tracing::info!(provider = classifier.provider_name(), "classifier ready");
    let fetcher = HttpFetcher::new();

    let report = newsvibe::ingest::run_once(&store, &fetcher, classifier.as_ref()).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
