//! Key-point extraction from the final summary.

use super::types::KeyPoint;

/// Default number of key points returned to clients.
pub const DEFAULT_MAX_KEY_POINTS: usize = 5;

/// Split `summary` on `.`, `!` and `?` and keep the first `max_points` non-empty fragments.
pub fn extract_key_points(summary: &str, max_points: usize) -> Vec<KeyPoint> {
    summary
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .take(max_points)
        .enumerate()
        .map(|(idx, fragment)| KeyPoint {
            index: idx + 1,
            text: fragment.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(index: usize, text: &str) -> KeyPoint {
        KeyPoint {
            index,
            text: text.into(),
        }
    }

    #[test]
    fn splits_on_sentence_terminators() {
        assert_eq!(
            extract_key_points("A. B. C.", DEFAULT_MAX_KEY_POINTS),
            vec![point(1, "A"), point(2, "B"), point(3, "C")]
        );
        assert_eq!(
            extract_key_points("Act now! Is it due? Yes", 5),
            vec![point(1, "Act now"), point(2, "Is it due"), point(3, "Yes")]
        );
    }

    #[test]
    fn caps_at_max_points_in_order() {
        let summary = "One. Two. Three. Four. Five. Six. Seven. Eight.";
        let points = extract_key_points(summary, 5);
        assert_eq!(points.len(), 5);
        assert_eq!(
            points.iter().map(|p| p.text.as_str()).collect::<Vec<_>>(),
            vec!["One", "Two", "Three", "Four", "Five"]
        );
        assert_eq!(points[4].label(), "Point 5: Five");
    }

    #[test]
    fn skips_empty_fragments() {
        let points = extract_key_points("...First!!  ?  Second.", 5);
        assert_eq!(points, vec![point(1, "First"), point(2, "Second")]);
        assert!(extract_key_points("  ", 5).is_empty());
        assert!(extract_key_points("Anything.", 0).is_empty());
    }
}
