use std::sync::LazyLock;

use regex::Regex;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})[ \t]+(.+)$").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*+•][ \t]+(.+)$").unwrap());
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)][ \t]+(.+)$").unwrap());
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*([^*]+?)(?::\*\*|\*\*:)[ \t]*(.*)$").unwrap());

/// Heading level that delimits subsections and pages.
pub const SECTION_LEVEL: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Bullet(String),
    Numbered(String),
    /// `**Label:** rest`
    Label { label: String, rest: String },
    Text(String),
    Empty,
}

impl Block {
    pub fn is_section_heading(&self) -> bool {
        matches!(self, Block::Heading { level, .. } if *level == SECTION_LEVEL)
    }

    /// Text of a list item with its marker stripped.
    pub fn list_item(&self) -> Option<&str> {
        match self {
            Block::Bullet(t) | Block::Numbered(t) => Some(t),
            _ => None,
        }
    }
}

pub fn classify_line(line: &str) -> Block {
    let line = line.trim();

    if line.is_empty() {
        return Block::Empty;
    }

    // ── Heading: #### text (a closing run of #'s is dropped) ──
    if let Some(caps) = HEADING_RE.captures(line) {
        let text = caps[2].trim().trim_end_matches('#').trim();
        if !text.is_empty() && !text.starts_with('#') {
            return Block::Heading {
                level: caps[1].len() as u8,
                text: text.to_string(),
            };
        }
        return Block::Text(line.to_string());
    }

    if let Some(caps) = BULLET_RE.captures(line) {
        return Block::Bullet(caps[1].trim().to_string());
    }

    if let Some(caps) = NUMBERED_RE.captures(line) {
        return Block::Numbered(caps[1].trim().to_string());
    }

    if let Some(caps) = LABEL_RE.captures(line) {
        return Block::Label {
            label: caps[1].trim().to_string(),
            rest: caps[2].trim().to_string(),
        };
    }

    Block::Text(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading() {
        let block = classify_line("#### Some heading text");
        assert!(matches!(&block, Block::Heading { level: 4, text } if text == "Some heading text"));
        assert!(block.is_section_heading());
    }

    #[test]
    fn heading_closing_hashes() {
        assert_eq!(
            classify_line("#### Title ####"),
            Block::Heading { level: 4, text: "Title".into() }
        );
    }

    #[test]
    fn marker_without_text_is_not_heading() {
        assert!(matches!(classify_line("####"), Block::Text(_)));
        assert!(matches!(classify_line("#### ##"), Block::Text(_)));
        assert!(matches!(classify_line("####### seven"), Block::Text(_)));
    }

    #[test]
    fn deeper_heading_is_not_section() {
        let b = classify_line("##### Detail");
        assert!(matches!(&b, Block::Heading { level: 5, .. }));
        assert!(!b.is_section_heading());
    }

    #[test]
    fn bullets_and_numbers() {
        assert_eq!(classify_line("- item"), Block::Bullet("item".into()));
        assert_eq!(classify_line("  * item"), Block::Bullet("item".into()));
        assert_eq!(classify_line("• item"), Block::Bullet("item".into()));
        assert_eq!(classify_line("3. third"), Block::Numbered("third".into()));
        assert_eq!(classify_line("12) twelfth"), Block::Numbered("twelfth".into()));
        assert_eq!(classify_line("- item").list_item(), Some("item"));
    }

    #[test]
    fn bold_label_is_not_bullet() {
        assert_eq!(
            classify_line("**Summary:** short"),
            Block::Label { label: "Summary".into(), rest: "short".into() }
        );
        assert_eq!(
            classify_line("**Key Takeaway**: done"),
            Block::Label { label: "Key Takeaway".into(), rest: "done".into() }
        );
    }

    #[test]
    fn empty_string() {
        assert_eq!(classify_line(""), Block::Empty);
    }

    #[test]
    fn whitespace_line_is_empty() {
        assert_eq!(classify_line(" \t "), Block::Empty);
        assert_eq!(classify_line("  more "), Block::Text("more".into()));
    }
}
