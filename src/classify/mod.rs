// src/classify/mod.rs
//! Two-tier category resolution: deterministic hint mapping first, then the
//! text classifier. Tiers short-circuit; the result is either a
//! currently-existing category name or no decision (which means the article
//! is not persisted).

pub mod client;
pub mod hints;

use crate::model::Source;

pub use crate::classify::client::{
    build_client_from_config, load_classifier_config, ClassifierClient, ClassifierConfig,
    DisabledClassifier, DynClassifier, MockClassifier, OpenAiClassifier,
};
pub use crate::classify::hints::map_category_hint;

/// Which tier produced the decision. Drives the run-report counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Hint,
    Model,
}

/// Resolve a category for one article. The second tuple field reports
/// whether a classifier call was made (for call accounting), independent of
/// whether it produced a decision.
pub async fn resolve_category(
    source: &Source,
    headline: &str,
    category_names: &[String],
    classifier: &dyn ClassifierClient,
) -> (Option<(String, Tier)>, bool) {
    // Tier 1: declared hint.
    if let Some(hint) = source.category_hint.as_deref() {
        if let Some(name) = map_category_hint(hint, category_names) {
            return (Some((name, Tier::Hint)), false);
        }
    }

    // Tier 2: text classification.
    if !classifier.is_available() {
        tracing::warn!(
            source = %source.name,
            "no classifier configured; skipping categorization"
        );
        return (None, false);
    }
    if category_names.is_empty() {
        tracing::warn!("no categories configured; skipping categorization");
        return (None, false);
    }

    let answer = classifier.classify(headline, category_names).await;
    // Accept only an exact, currently-existing category name. "OTHER",
    // empty, or an unlisted string all mean no decision.
    let decided = answer
        .and_then(|a| category_names.iter().find(|n| **n == a).cloned())
        .map(|name| (name, Tier::Model));
    (decided, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(hint: Option<&str>) -> Source {
        Source {
            id: 1,
            name: "test".into(),
            url: "https://example.test/feed".into(),
            category_hint: hint.map(str::to_string),
            weight: 1.0,
            min_score: 0,
        }
    }

    fn cats() -> Vec<String> {
        vec!["Robotics".into(), "AI".into(), "US Politics".into()]
    }

    #[tokio::test]
    async fn hint_tier_short_circuits() {
        let client = MockClassifier {
            fixed: Some("AI".into()),
        };
        let (decided, called) =
            resolve_category(&src(Some("tech/robotics")), "headline", &cats(), &client).await;
        assert_eq!(decided, Some(("Robotics".into(), Tier::Hint)));
        assert!(!called);
    }

    #[tokio::test]
    async fn model_tier_accepts_listed_name() {
        let client = MockClassifier {
            fixed: Some("AI".into()),
        };
        let (decided, called) =
            resolve_category(&src(Some("tech")), "headline", &cats(), &client).await;
        assert_eq!(decided, Some(("AI".into(), Tier::Model)));
        assert!(called);
    }

    #[tokio::test]
    async fn other_and_unlisted_answers_are_no_decision() {
        for answer in ["OTHER", "Sports", ""] {
            let client = MockClassifier {
                fixed: Some(answer.into()),
            };
            let (decided, called) =
                resolve_category(&src(None), "headline", &cats(), &client).await;
            assert_eq!(decided, None);
            assert!(called);
        }
    }

    #[tokio::test]
    async fn unavailable_classifier_defers_without_calling() {
        let (decided, called) =
            resolve_category(&src(Some("tech")), "headline", &cats(), &DisabledClassifier).await;
        assert_eq!(decided, None);
        assert!(!called);
    }
}
