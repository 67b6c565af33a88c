use crate::model::Difficulty;

pub const PLACEHOLDER_CONTENT: &str = "Content will be available soon.";

/// Fallback wording and estimates used when the source text does not
/// provide a value. Every method has a default, so an implementation only
/// overrides the heuristics it wants to change; the structural pipeline
/// never inspects the strings it gets back.
pub trait ContentPolicy: Send + Sync {
    /// Length-proportional reading estimate in minutes. Heuristic, not a
    /// reading-speed model: `max(5, ceil(chars / 250) * 3)`.
    fn estimated_minutes(&self, body: &str) -> usize {
        let chars = body.chars().count();
        (chars.div_ceil(250) * 3).max(5)
    }

    fn estimated_time(&self, body: &str) -> String {
        format!("{} min", self.estimated_minutes(body))
    }

    fn difficulty(&self, _title: &str, _body: &str) -> Difficulty {
        Difficulty::Intermediate
    }

    fn untitled(&self, index: usize) -> String {
        format!("Section {}", index + 1)
    }

    fn default_summary(&self, title: &str) -> String {
        format!("Learn about {}", title)
    }

    fn generic_key_points(&self, title: &str) -> Vec<String> {
        vec![
            format!("Understand the core concepts of {}", title),
            format!("Apply {} in practical scenarios", title),
            format!("Recognize common patterns and pitfalls in {}", title),
        ]
    }

    fn placeholder_takeaway(&self, title: &str) -> String {
        format!("Check back soon for more on {}.", title)
    }

    fn single_page_takeaway(&self, title: &str) -> String {
        format!("This page completes the key concepts of {}.", title)
    }

    fn continue_takeaway(&self, title: &str, next_part: usize) -> String {
        format!("Continue to Part {} to learn more about {}.", next_part, title)
    }

    fn final_takeaway(&self, title: &str) -> String {
        format!("You have completed all parts of {}.", title)
    }

    /// Used for heading-delimited pages that carry no `**Key Takeaway:**`.
    fn page_takeaway(&self, page_title: &str) -> String {
        format!("This section completes your understanding of {}.", page_title)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl ContentPolicy for DefaultPolicy {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_has_five_minute_floor() {
        assert_eq!(DefaultPolicy.estimated_minutes(""), 5);
        assert_eq!(DefaultPolicy.estimated_minutes(&"a".repeat(250)), 5);
        assert_eq!(DefaultPolicy.estimated_minutes(&"a".repeat(251)), 6);
    }

    #[test]
    fn estimate_grows_with_length() {
        assert_eq!(DefaultPolicy.estimated_minutes(&"a".repeat(1000)), 12);
        assert_eq!(DefaultPolicy.estimated_time(&"a".repeat(1001)), "15 min");
    }

    #[test]
    fn estimate_counts_chars_not_bytes() {
        // 300 two-byte chars: 2 blocks of 250 chars, not 3 blocks of bytes
        assert_eq!(DefaultPolicy.estimated_minutes(&"é".repeat(300)), 6);
    }

    struct Beginner;
    impl ContentPolicy for Beginner {
        fn difficulty(&self, _: &str, _: &str) -> Difficulty {
            Difficulty::Beginner
        }
    }

    #[test]
    fn overrides_only_touch_their_method() {
        assert_eq!(Beginner.difficulty("x", "y"), Difficulty::Beginner);
        assert_eq!(Beginner.default_summary("Loops"), "Learn about Loops");
    }
}
