use std::sync::LazyLock;

use regex::Regex;

use crate::config::PipelineConfig;
use crate::model::Page;
use crate::policy::{ContentPolicy, PLACEHOLDER_CONTENT};

static PARAGRAPH_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\r?\n[ \t]*)+").unwrap());

/// Non-empty paragraphs of `body`, split on one or more blank lines.
pub fn split_paragraphs(body: &str) -> Vec<String> {
    let body = body.replace("\r\n", "\n");
    PARAGRAPH_BREAK_RE
        .split(&body)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Group a section body into pages of at most `paragraphs_per_page`
/// paragraphs. Always returns at least one page.
pub fn paginate(
    body: &str,
    title: &str,
    config: &PipelineConfig,
    policy: &dyn ContentPolicy,
) -> Vec<Page> {
    let paragraphs = split_paragraphs(body);
    pages_from_paragraphs(&paragraphs, title, config.paragraphs_per_page, policy)
}

/// Shared page builder: `"{title} - Part {n}"` titles when there is more
/// than one page, a "continue" takeaway on all but the last page.
pub fn pages_from_paragraphs(
    paragraphs: &[String],
    title: &str,
    per_page: usize,
    policy: &dyn ContentPolicy,
) -> Vec<Page> {
    if paragraphs.is_empty() {
        return vec![placeholder_page(title, policy)];
    }

    let chunks: Vec<&[String]> = paragraphs.chunks(per_page.max(1)).collect();
    let total = chunks.len();

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let n = i + 1;
            let (page_title, key_takeaway) = if total == 1 {
                (title.to_string(), policy.single_page_takeaway(title))
            } else if n < total {
                (part_title(title, n), policy.continue_takeaway(title, n + 1))
            } else {
                (part_title(title, n), policy.final_takeaway(title))
            };
            Page {
                page_number: n,
                page_title,
                content: chunk.join("\n\n"),
                key_takeaway,
            }
        })
        .collect()
}

pub fn placeholder_page(title: &str, policy: &dyn ContentPolicy) -> Page {
    Page {
        page_number: 1,
        page_title: title.to_string(),
        content: PLACEHOLDER_CONTENT.to_string(),
        key_takeaway: policy.placeholder_takeaway(title),
    }
}

pub fn part_title(title: &str, n: usize) -> String {
    format!("{} - Part {}", title, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DefaultPolicy;

    fn pages(body: &str, title: &str) -> Vec<Page> {
        paginate(body, title, &PipelineConfig::default(), &DefaultPolicy)
    }

    #[test]
    fn empty_body_gets_placeholder() {
        let p = pages("", "Loops");
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].content, "Content will be available soon.");
        assert_eq!(p[0].page_title, "Loops");
        assert_eq!(p[0].key_takeaway, DefaultPolicy.placeholder_takeaway("Loops"));
    }

    #[test]
    fn single_paragraph_single_page() {
        let p = pages("Only paragraph.", "Loops");
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].page_title, "Loops");
        assert_eq!(p[0].content, "Only paragraph.");
        assert!(p[0].key_takeaway.contains("completes the key concepts"));
    }

    #[test]
    fn three_paragraphs_make_two_parts() {
        let p = pages("Para one.\n\nPara two.\n\nPara three.", "Details");
        assert_eq!(p.len(), 2);
        assert_eq!(p[0].page_title, "Details - Part 1");
        assert_eq!(p[0].content, "Para one.\n\nPara two.");
        assert!(p[0].key_takeaway.contains("Continue to Part 2"));
        assert_eq!(p[1].page_number, 2);
        assert_eq!(p[1].page_title, "Details - Part 2");
        assert_eq!(p[1].content, "Para three.");
        assert_eq!(p[1].key_takeaway, DefaultPolicy.final_takeaway("Details"));
    }

    #[test]
    fn two_paragraphs_keep_bare_title() {
        let p = pages("A.\n\nB.", "Pair");
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].page_title, "Pair");
        assert_eq!(p[0].content, "A.\n\nB.");
    }

    #[test]
    fn several_blank_lines_are_one_break() {
        assert_eq!(split_paragraphs("a\n\n\n  \n\nb\r\n\r\nc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn single_newline_does_not_split() {
        assert_eq!(split_paragraphs("line one\nline two"), vec!["line one\nline two"]);
    }

    #[test]
    fn page_size_is_configurable() {
        let config = PipelineConfig::default().with_paragraphs_per_page(1);
        let p = paginate("a\n\nb\n\nc", "T", &config, &DefaultPolicy);
        assert_eq!(p.len(), 3);
        assert_eq!(p[2].page_title, "T - Part 3");
    }
}
