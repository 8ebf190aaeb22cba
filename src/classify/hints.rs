// src/classify/hints.rs
//! Tier-1 classification: deterministic mapping from a source's declared
//! category hint. First matching rule decides; a match whose target category
//! is not currently configured yields no decision, as does anything outside
//! the table (generic hints like "news" or "tech" fall through to tier 2).

/// One mapping rule over the lowercased hint: any of `any` must appear, and
/// when `with_any` is non-empty, one of those must appear too.
struct HintRule {
    category: &'static str,
    any: &'static [&'static str],
    with_any: &'static [&'static str],
}

const HINT_RULES: &[HintRule] = &[
    HintRule {
        category: "Robotics",
        any: &["robotics"],
        with_any: &[],
    },
    HintRule {
        category: "AI",
        any: &["ai", "artificial", "machine learning"],
        with_any: &[],
    },
    HintRule {
        category: "US Politics",
        any: &["politics"],
        with_any: &["us", "united states"],
    },
];

/// Map a hint to a currently-existing category name, or defer.
pub fn map_category_hint(hint: &str, category_names: &[String]) -> Option<String> {
    let hint = hint.to_lowercase();
    if hint.is_empty() {
        return None;
    }

    for rule in HINT_RULES {
        let hit = rule.any.iter().any(|n| hint.contains(n))
            && (rule.with_any.is_empty() || rule.with_any.iter().any(|n| hint.contains(n)));
        if hit {
            return category_names
                .iter()
                .find(|name| name.as_str() == rule.category)
                .cloned();
        }
    }
    None
}
