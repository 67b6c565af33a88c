use std::sync::LazyLock;

use regex::Regex;

use super::blocks::{classify_line, Block};
use crate::config::PipelineConfig;

static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

const KEYWORDS: &[&str] = &["key", "important"];

/// Best-effort scan of a section body for enumerable insights.
///
/// List items (bullets or numbers) and lines mentioning "key"/"important"
/// qualify, with their list marker stripped. When nothing qualifies, the
/// first few long sentences stand in. This is a heuristic: it does not
/// judge whether a line is actually an insight.
pub fn extract_key_points(body: &str, config: &PipelineConfig) -> Vec<String> {
    let mut points: Vec<String> = body.lines().filter_map(qualify).collect();

    if points.is_empty() {
        points = fallback_sentences(body, config);
    }

    points.truncate(config.max_key_points);
    points
}

fn qualify(line: &str) -> Option<String> {
    match classify_line(line) {
        Block::Empty => None,
        Block::Bullet(t) | Block::Numbered(t) => Some(t),
        Block::Heading { text, .. } => mentions_keyword(&text).then_some(text),
        _ => {
            let t = line.trim();
            mentions_keyword(t).then(|| t.to_string())
        }
    }
}

fn mentions_keyword(line: &str) -> bool {
    let lower = line.to_lowercase();
    KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn fallback_sentences(body: &str, config: &PipelineConfig) -> Vec<String> {
    SENTENCE_END_RE
        .split(body)
        .map(str::trim)
        .filter(|s| s.chars().count() > config.min_sentence_chars)
        .take(config.fallback_sentences)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(body: &str) -> Vec<String> {
        extract_key_points(body, &PipelineConfig::default())
    }

    #[test]
    fn bullets_and_numbers_are_stripped() {
        let body = "Intro line.\n- first bullet\n* second bullet\n1. numbered one";
        assert_eq!(points(body), vec!["first bullet", "second bullet", "numbered one"]);
    }

    #[test]
    fn keyword_lines_kept_verbatim() {
        let body = "Nothing here.\nThe KEY idea is ownership.\nThis is Important to remember.";
        assert_eq!(
            points(body),
            vec!["The KEY idea is ownership.", "This is Important to remember."]
        );
    }

    #[test]
    fn caps_at_five() {
        let body = (1..=9).map(|i| format!("- point {}", i)).collect::<Vec<_>>().join("\n");
        let p = points(&body);
        assert_eq!(p.len(), 5);
        assert_eq!(p[4], "point 5");
    }

    #[test]
    fn sentence_fallback_takes_first_three_long_sentences() {
        let body = "Short one. Rust compiles to native machine code! Ownership replaces a garbage collector? \
                    Tiny. Borrowing lets you reference data safely. Lifetimes are checked at compile time.";
        assert_eq!(
            points(body),
            vec![
                "Rust compiles to native machine code",
                "Ownership replaces a garbage collector",
                "Borrowing lets you reference data safely",
            ]
        );
    }

    #[test]
    fn fallback_sentences_keep_inner_spacing() {
        assert_eq!(
            points("  Ownership  replaces a garbage\ncollector.  Tiny."),
            vec!["Ownership  replaces a garbage\ncollector"]
        );
    }

    #[test]
    fn sentence_must_exceed_min_length() {
        // exactly 20 chars does not qualify
        assert!(points("abcdefghij klmnopqrs.").is_empty());
        assert_eq!(points("abcdefghij klmnopqrst.").len(), 1);
    }

    #[test]
    fn empty_body_has_no_points() {
        assert!(points("").is_empty());
        assert!(points("   \n  ").is_empty());
    }
}
