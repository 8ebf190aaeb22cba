// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod classify;
pub mod config;
pub mod ingest;
pub mod model;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::classify::{build_client_from_config, load_classifier_config, DynClassifier};
pub use crate::ingest::fetch::{ArticleFetcher, HttpFetcher};
pub use crate::ingest::{run_once, RunReport};
pub use crate::model::{Article, CanonicalArticle, Category, NewArticle, Source};
pub use crate::store::{ArticleStore, JsonStore, MemStore, StoreError};
