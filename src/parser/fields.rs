use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::blocks::{classify_line, Block, SECTION_LEVEL};
use super::pages::{pages_from_paragraphs, split_paragraphs};
use super::sections::{segment, INTRODUCTION_TITLE};
use crate::config::PipelineConfig;
use crate::model::Page;
use crate::policy::{ContentPolicy, PLACEHOLDER_CONTENT};

// A labeled block runs until a blank line, the next bold label, a heading,
// or the end of the text. Key points also run across blank lines while the
// next line is still a list item.
static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\*\*Summary:?\*\*:?\s*(.*?)(?:\n[ \t]*\n|\n[ \t]*\*\*|\n[ \t]*#|\z)").unwrap()
});
static KEY_POINTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)\*\*Key\s+Learning\s+Points:?\*\*:?\s*(.*?)(?:\n[ \t]*\n\s*[^\s\-*+•\d]|\n[ \t]*\*\*|\n[ \t]*#|\z)",
    )
    .unwrap()
});
static TAKEAWAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\*\*Key\s+Takeaway:?\*\*:?\s*(.*?)\s*(?:\n[ \t]*\n|\z)").unwrap()
});

/// Fields recovered from one subsection's generated markdown, with
/// defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredFields {
    pub summary: String,
    pub key_points: Vec<String>,
    pub pages: Vec<Page>,
}

/// A labeled block located in the source: its trimmed value and the byte
/// range from the label to the end of the value.
#[derive(Debug, Clone)]
struct Labeled {
    value: String,
    span: Range<usize>,
}

fn find_labeled(re: &Regex, text: &str) -> Option<Labeled> {
    let caps = re.captures(text)?;
    let whole = caps.get(0)?;
    let value = caps.get(1)?;
    Some(Labeled {
        value: value.as_str().trim().to_string(),
        span: whole.start()..value.end(),
    })
}

/// Whether the text carries any of the labeled blocks this extractor reads.
pub fn has_labeled_blocks(markdown: &str) -> bool {
    SUMMARY_RE.is_match(markdown) || KEY_POINTS_RE.is_match(markdown) || TAKEAWAY_RE.is_match(markdown)
}

fn list_items(block: &str) -> Vec<String> {
    let items: Vec<String> = block
        .lines()
        .filter_map(|l| classify_line(l).list_item().map(str::to_string))
        .collect();
    if !items.is_empty() {
        return items;
    }
    block
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a trailing `**Key Takeaway:**` clause off a page body.
pub fn split_takeaway(body: &str) -> (String, Option<String>) {
    match find_labeled(&TAKEAWAY_RE, body) {
        Some(l) => {
            let mut content = String::with_capacity(body.len());
            content.push_str(&body[..l.span.start]);
            content.push_str(&body[l.span.end..]);
            let takeaway = Some(l.value).filter(|v| !v.is_empty());
            (content.trim().to_string(), takeaway)
        }
        None => (body.trim().to_string(), None),
    }
}

/// First `**Summary:**` and `**Key Learning Points:**` blocks of a body,
/// plus the body with both blocks cut out. Key-point list markers are
/// stripped; a block without list markers contributes its non-empty lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledFields {
    pub summary: Option<String>,
    pub key_points: Option<Vec<String>>,
    pub remainder: String,
}

pub fn take_labeled_fields(body: &str) -> LabeledFields {
    let summary_block = find_labeled(&SUMMARY_RE, body);
    let points_block = find_labeled(&KEY_POINTS_RE, body);

    let summary = summary_block
        .as_ref()
        .map(|l| l.value.clone())
        .filter(|v| !v.is_empty());
    let key_points = points_block
        .as_ref()
        .map(|l| list_items(&l.value))
        .filter(|items| !items.is_empty());

    let mut spans: Vec<Range<usize>> = summary_block
        .into_iter()
        .chain(points_block)
        .map(|l| l.span)
        .collect();

    LabeledFields {
        summary,
        key_points,
        remainder: strip_spans(body, &mut spans),
    }
}

/// Pull Summary, Key Learning Points and heading-delimited pages out of
/// semi-structured markdown. Every field falls back to a policy default;
/// markdown with no `####` pages is redistributed into at most
/// `max_synthetic_pages` part-numbered pages.
pub fn extract_fields(
    markdown: &str,
    title: &str,
    config: &PipelineConfig,
    policy: &dyn ContentPolicy,
) -> StructuredFields {
    let (_, body) = take_leading_heading(markdown);
    let labeled = take_labeled_fields(body);

    StructuredFields {
        summary: labeled.summary.unwrap_or_else(|| policy.default_summary(title)),
        key_points: labeled.key_points.unwrap_or_else(|| policy.generic_key_points(title)),
        pages: build_pages(&labeled.remainder, title, config, policy),
    }
}

/// Text of a `#`..`###` heading that opens the markdown, if any.
pub fn leading_heading(markdown: &str) -> Option<String> {
    take_leading_heading(markdown).0
}

fn take_leading_heading(markdown: &str) -> (Option<String>, &str) {
    let trimmed = markdown.trim_start();
    let first_line = trimmed.lines().next().unwrap_or("");
    match classify_line(first_line) {
        Block::Heading { level, text } if level < SECTION_LEVEL => {
            (Some(text), &trimmed[first_line.len()..])
        }
        _ => (None, markdown),
    }
}

fn strip_spans(text: &str, spans: &mut [Range<usize>]) -> String {
    spans.sort_by_key(|r| r.start);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans.iter() {
        if span.start < cursor {
            continue;
        }
        out.push_str(&text[cursor..span.start]);
        out.push('\n');
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn build_pages(
    remainder: &str,
    title: &str,
    config: &PipelineConfig,
    policy: &dyn ContentPolicy,
) -> Vec<Page> {
    let segments = segment(remainder);

    if segments.sections.is_empty() {
        let paragraphs = split_paragraphs(&segments.preamble);
        let per_page = paragraphs.len().div_ceil(config.max_synthetic_pages.max(1));
        return pages_from_paragraphs(&paragraphs, title, per_page, policy);
    }

    let preamble = (!segments.preamble.is_empty())
        .then(|| (INTRODUCTION_TITLE.to_string(), segments.preamble.clone()));

    preamble
        .into_iter()
        .chain(segments.sections.into_iter().map(|s| (s.title, s.body)))
        .enumerate()
        .map(|(i, (page_title, body))| {
            let (content, takeaway) = split_takeaway(&body);
            let content = if content.is_empty() {
                PLACEHOLDER_CONTENT.to_string()
            } else {
                content
            };
            let key_takeaway = takeaway.unwrap_or_else(|| policy.page_takeaway(&page_title));
            Page {
                page_number: i + 1,
                page_title,
                content,
                key_takeaway,
            }
        })
        .collect()
}

// ── Tests ──
