use super::blocks::{classify_line, Block};
use crate::model::Section;

pub const INTRODUCTION_TITLE: &str = "Introduction";
pub const CONTENT_TITLE: &str = "Content";

/// Raw split at `####` boundaries: text before the first heading plus the
/// headed sections in source order.
#[derive(Debug, Clone, Default)]
pub struct Segments {
    pub preamble: String,
    pub sections: Vec<Section>,
}

pub fn segment(markdown: &str) -> Segments {
    let mut preamble: Vec<&str> = Vec::new();
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in markdown.lines() {
        let block = classify_line(line);
        if block.is_section_heading() {
            if let Block::Heading { text, .. } = block {
                if let Some((title, body)) = current.take() {
                    sections.push(make_section(title, &body));
                }
                current = Some((text, Vec::new()));
                continue;
            }
        }
        match current.as_mut() {
            Some((_, body)) => body.push(line),
            None => preamble.push(line),
        }
    }

    if let Some((title, body)) = current {
        sections.push(make_section(title, &body));
    }

    Segments {
        preamble: join_trimmed(&preamble),
        sections,
    }
}

/// Split markdown into titled sections at `####` headings.
///
/// Never fails: pre-heading text becomes an "Introduction" section when
/// non-empty, and input with no heading at all comes back as one "Content"
/// section. Empty input yields no sections.
pub fn split_sections(markdown: &str) -> Vec<Section> {
    let Segments { preamble, sections } = segment(markdown);

    if sections.is_empty() {
        if preamble.is_empty() {
            return Vec::new();
        }
        return vec![Section {
            title: CONTENT_TITLE.to_string(),
            body: preamble,
        }];
    }

    let mut out = Vec::with_capacity(sections.len() + 1);
    if !preamble.is_empty() {
        out.push(Section {
            title: INTRODUCTION_TITLE.to_string(),
            body: preamble,
        });
    }
    out.extend(sections);
    out
}

fn make_section(title: String, body: &[&str]) -> Section {
    Section {
        title,
        body: join_trimmed(body),
    }
}

fn join_trimmed(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(md: &str) -> Vec<String> {
        split_sections(md).into_iter().map(|s| s.title).collect()
    }

    #[test]
    fn two_sections_in_order() {
        let md = "#### Intro\nHello world.\n\n#### Details\nPara one.\n\nPara two.\n\nPara three.";
        let sections = split_sections(md);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Intro");
        assert_eq!(sections[0].body, "Hello world.");
        assert_eq!(sections[1].title, "Details");
        assert_eq!(sections[1].body, "Para one.\n\nPara two.\n\nPara three.");
    }

    #[test]
    fn preamble_becomes_introduction() {
        assert_eq!(
            titles("Welcome to the module.\n\n#### First\nbody"),
            vec!["Introduction", "First"]
        );
    }

    #[test]
    fn blank_preamble_is_dropped() {
        assert_eq!(titles("\n   \n#### First\nbody"), vec!["First"]);
    }

    #[test]
    fn heading_without_body_is_kept() {
        let sections = split_sections("#### Empty\n#### Full\ntext");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].body, "");
        assert_eq!(sections[1].body, "text");
    }

    #[test]
    fn other_heading_levels_stay_in_body() {
        let sections = split_sections("#### Top\n### Not a boundary\n##### Nor this\ntext");
        assert_eq!(sections.len(), 1);
        assert!(sections[0].body.contains("### Not a boundary"));
        assert!(sections[0].body.contains("##### Nor this"));
    }

    #[test]
    fn no_heading_returns_single_content_section() {
        let sections = split_sections("Just some prose\nthat matches nothing");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, CONTENT_TITLE);
    }

    #[test]
    fn empty_input_has_no_sections() {
        assert!(split_sections("").is_empty());
        assert!(split_sections("  \n\n ").is_empty());
    }

    #[test]
    fn module_fixture() {
        let md = std::fs::read_to_string("tests/fixtures/module.md").unwrap();
        assert_eq!(
            titles(&md),
            vec!["Introduction", "Variables", "Control Flow", "Functions"]
        );
    }
}
