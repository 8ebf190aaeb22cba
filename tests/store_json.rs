// tests/store_json.rs
//! JsonStore persistence: atomic commit, reload, and uniqueness across
//! process restarts.

use newsvibe::model::NewArticle;
use newsvibe::store::{ArticleStore, JsonStore, StoreError};

fn record(title: &str, url: &str) -> NewArticle {
    NewArticle {
        title: title.into(),
        url: url.into(),
        source: "S".into(),
        source_id: 1,
        category: "AI".into(),
        summary: "sum".into(),
        published_at: Some(1_700_000_000),
    }
}

#[test]
fn commit_then_reopen_preserves_articles_and_uniqueness() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("articles.json");

    {
        let store = JsonStore::open(&path).unwrap();
        store.insert_article(record("A", "https://example.test/a")).unwrap();
        store.insert_article(record("B", "https://example.test/b")).unwrap();
        store.commit().unwrap();
    }

    let reopened = JsonStore::open(&path).unwrap();
    let articles = reopened.articles();
    assert_eq!(articles.len(), 2);
    assert!(reopened.exists_article_by_url("https://example.test/a"));

    // Uniqueness survives the restart.
    assert!(matches!(
        reopened.insert_article(record("A again", "https://example.test/a")),
        Err(StoreError::DuplicateUrl)
    ));

    // Ids keep growing from the persisted maximum.
    let id = reopened
        .insert_article(record("C", "https://example.test/c"))
        .unwrap();
    assert_eq!(id, 3);
}

#[test]
fn open_on_missing_file_starts_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let store = JsonStore::open(tmp.path().join("fresh.json")).unwrap();
    assert!(store.articles().is_empty());
    assert!(store.list_sources().is_empty());
}

#[test]
fn commit_creates_parent_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested/dir/articles.json");
    let store = JsonStore::open(&path).unwrap();
    store.insert_article(record("A", "https://example.test/a")).unwrap();
    store.commit().unwrap();
    assert!(path.exists());
}
