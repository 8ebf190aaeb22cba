// src/ingest/score.rs
//! Engagement-score extraction from free-text feed metadata.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Pull a popularity signal out of a description/summary: a number adjacent
/// to one of {points, point, score, karma, upvote, upvotes}, in either order
/// ("Points: 150" or "150 points"). Returns 0 when nothing matches.
pub fn extract_score_from_text(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }

    static RE_PREFIX: OnceCell<Regex> = OnceCell::new();
    static RE_SUFFIX: OnceCell<Regex> = OnceCell::new();
    let patterns = [
        RE_PREFIX
            .get_or_init(|| Regex::new(r"(?i)(?:points?|score|karma|upvotes?)[:\s]+(\d+)").unwrap()),
        RE_SUFFIX
            .get_or_init(|| Regex::new(r"(?i)(\d+)\s*(?:points?|score|karma|upvotes?)").unwrap()),
    ];

    for re in patterns {
        for caps in re.captures_iter(text) {
            // A run of digits can still overflow u32; skip and keep looking.
            if let Ok(n) = caps[1].parse::<u32>() {
                return n;
            }
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_then_number() {
        assert_eq!(extract_score_from_text("Points: 150"), 150);
        assert_eq!(extract_score_from_text("score 42"), 42);
        assert_eq!(extract_score_from_text("KARMA: 200"), 200);
    }

    #[test]
    fn number_then_token() {
        assert_eq!(extract_score_from_text("150 points"), 150);
        assert_eq!(extract_score_from_text("1 upvote"), 1);
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(extract_score_from_text("Points: 10 ... Points: 99"), 10);
    }

    #[test]
    fn no_signal_is_zero() {
        assert_eq!(extract_score_from_text(""), 0);
        assert_eq!(extract_score_from_text("no numbers here"), 0);
        assert_eq!(extract_score_from_text("published at 10:30"), 0);
    }

    #[test]
    fn overflow_falls_through_to_next_candidate() {
        let s = "score: 99999999999999999999, then 7 points";
        assert_eq!(extract_score_from_text(s), 7);
    }
}
