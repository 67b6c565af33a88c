use std::collections::HashSet;

use tracing::{debug, warn};

use super::fields::{extract_fields, has_labeled_blocks, leading_heading, take_labeled_fields};
use super::key_points::extract_key_points;
use super::pages::{paginate, placeholder_page, split_paragraphs};
use super::sections::{segment, split_sections};
use crate::config::PipelineConfig;
use crate::model::{Difficulty, Page, RawModule, RawSubsection, Section, Subsection};
use crate::policy::{ContentPolicy, PLACEHOLDER_CONTENT};

/// Lowercase, with every run of non-alphanumerics collapsed to one `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Explicit id, else title slug, else `subsection-{module_id}-{index}`.
pub fn subsection_id(explicit: Option<&str>, title: &str, module_id: &str, index: usize) -> String {
    if let Some(id) = explicit.map(str::trim).filter(|id| !id.is_empty()) {
        return id.to_string();
    }
    let slug = slugify(title);
    if !slug.is_empty() {
        return slug;
    }
    format!("subsection-{}-{}", module_id, index)
}

/// True when a record still lacks structured fields and must be parsed.
pub fn needs_processing(raw: &RawSubsection) -> bool {
    raw.pages.as_ref().map_or(true, |p| p.is_empty()) || raw.summary.is_none() || raw.key_points.is_none()
}

/// Composes the stages into canonical `Subsection` records.
pub struct Normalizer<'a> {
    pub config: &'a PipelineConfig,
    pub policy: &'a dyn ContentPolicy,
}

impl<'a> Normalizer<'a> {
    pub fn new(config: &'a PipelineConfig, policy: &'a dyn ContentPolicy) -> Self {
        Self { config, policy }
    }

    /// One subsection per `####` section of module-level markdown.
    pub fn module_markdown(&self, markdown: &str, module_id: &str) -> Vec<Subsection> {
        let sections = split_sections(markdown);
        debug!(module_id, sections = sections.len(), "segmented module markdown");
        let subsections = sections
            .iter()
            .enumerate()
            .map(|(i, s)| self.section(s, None, module_id, i))
            .collect();
        dedupe_ids(subsections)
    }

    /// A plain section: summary is a `**Summary:**` block or else the first
    /// paragraph; labeled blocks are cut from the paginated content.
    pub fn section(&self, section: &Section, explicit_id: Option<&str>, module_id: &str, index: usize) -> Subsection {
        let title = self.title_or_untitled(Some(section.title.as_str()), index);
        let body = &section.body;
        let labeled = take_labeled_fields(body);

        let summary = labeled
            .summary
            .or_else(|| split_paragraphs(&labeled.remainder).into_iter().next())
            .unwrap_or_else(|| self.policy.default_summary(&title));
        let mut key_points = labeled
            .key_points
            .unwrap_or_else(|| extract_key_points(&labeled.remainder, self.config));
        if key_points.is_empty() && !body.trim().is_empty() {
            key_points = self.policy.generic_key_points(&title);
        }

        Subsection {
            id: subsection_id(explicit_id, &section.title, module_id, index),
            summary,
            key_points: self.cap(key_points),
            pages: paginate(&labeled.remainder, &title, self.config, self.policy),
            difficulty: self.policy.difficulty(&title, body),
            estimated_time: self.policy.estimated_time(body),
            title,
        }
    }

    /// A single subsection's generated markdown with labeled blocks.
    pub fn subsection_markdown(
        &self,
        markdown: &str,
        title: Option<&str>,
        explicit_id: Option<&str>,
        module_id: &str,
        index: usize,
    ) -> Subsection {
        let heading = leading_heading(markdown);
        let source = source_title(title).or(heading.as_deref());
        let title = self.title_or_untitled(source, index);
        let fields = extract_fields(markdown, &title, self.config, self.policy);

        Subsection {
            id: subsection_id(explicit_id, source.unwrap_or(""), module_id, index),
            summary: fields.summary,
            key_points: self.cap(fields.key_points),
            pages: fields.pages,
            difficulty: self.policy.difficulty(&title, markdown),
            estimated_time: self.policy.estimated_time(markdown),
            title,
        }
    }

    /// A record delivered by an upstream collaborator. Fields it already
    /// carries win over anything parsed from its `content`.
    pub fn raw(&self, raw: &RawSubsection, module_id: &str, index: usize) -> Subsection {
        let content = raw.content.as_deref().unwrap_or("");
        let heading = leading_heading(content);
        let source = source_title(raw.title.as_deref()).or(heading.as_deref());
        let title = self.title_or_untitled(source, index);

        let mut parsed = if !needs_processing(raw) {
            None
        } else if has_labeled_blocks(content) || !segment(content).sections.is_empty() {
            Some(self.subsection_markdown(content, Some(title.as_str()), raw.id.as_deref(), module_id, index))
        } else {
            let section = Section {
                title: title.clone(),
                body: content.to_string(),
            };
            Some(self.section(&section, raw.id.as_deref(), module_id, index))
        };

        let pages = match raw.pages.as_deref() {
            Some(pages) if !pages.is_empty() => self.renumber(pages, &title),
            _ => parsed
                .as_mut()
                .map(|p| std::mem::take(&mut p.pages))
                .unwrap_or_else(|| vec![placeholder_page(&title, self.policy)]),
        };

        let summary = raw
            .summary
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| parsed.as_ref().map(|p| p.summary.clone()))
            .unwrap_or_else(|| self.policy.default_summary(&title));

        let key_points = raw
            .key_points
            .clone()
            .or_else(|| parsed.as_ref().map(|p| p.key_points.clone()))
            .unwrap_or_default();

        let estimate_source = if content.trim().is_empty() {
            pages.iter().map(|p| p.content.as_str()).collect::<Vec<_>>().join("\n\n")
        } else {
            content.to_string()
        };

        Subsection {
            id: subsection_id(raw.id.as_deref(), source.unwrap_or(""), module_id, index),
            summary,
            key_points: self.cap(key_points),
            pages,
            difficulty: raw
                .difficulty
                .as_deref()
                .and_then(Difficulty::parse)
                .unwrap_or_else(|| self.policy.difficulty(&title, content)),
            estimated_time: raw
                .estimated_time
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| self.policy.estimated_time(&estimate_source)),
            title,
        }
    }

    pub fn raw_list(&self, raws: &[RawSubsection], module_id: &str) -> Vec<Subsection> {
        let subsections = raws
            .iter()
            .enumerate()
            .map(|(i, r)| self.raw(r, module_id, i))
            .collect();
        dedupe_ids(subsections)
    }

    /// Structured subsections when present, else the module's markdown.
    pub fn module(&self, module: &RawModule) -> Vec<Subsection> {
        if !module.subsections.is_empty() {
            return self.raw_list(&module.subsections, &module.id);
        }
        self.module_markdown(module.content.as_deref().unwrap_or(""), &module.id)
    }

    fn title_or_untitled(&self, title: Option<&str>, index: usize) -> String {
        title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.policy.untitled(index))
    }

    fn cap(&self, mut points: Vec<String>) -> Vec<String> {
        points.truncate(self.config.max_key_points);
        points
    }

    fn renumber(&self, pages: &[Page], title: &str) -> Vec<Page> {
        pages
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let page_title = if p.page_title.trim().is_empty() {
                    title.to_string()
                } else {
                    p.page_title.clone()
                };
                Page {
                    page_number: i + 1,
                    content: if p.content.trim().is_empty() {
                        PLACEHOLDER_CONTENT.to_string()
                    } else {
                        p.content.clone()
                    },
                    key_takeaway: if p.key_takeaway.trim().is_empty() {
                        self.policy.page_takeaway(&page_title)
                    } else {
                        p.key_takeaway.clone()
                    },
                    page_title,
                }
            })
            .collect()
    }
}

/// A caller-supplied title, ignoring blank ones. Ids derive from this, not
/// from the "Section N" display fallback.
fn source_title(title: Option<&str>) -> Option<&str> {
    title.map(str::trim).filter(|t| !t.is_empty())
}

/// Repeated ids get a `-2`, `-3`, ... suffix in list order.
pub fn dedupe_ids(mut subsections: Vec<Subsection>) -> Vec<Subsection> {
    let mut seen: HashSet<String> = subsections.iter().map(|s| s.id.clone()).collect();
    let mut claimed: HashSet<String> = HashSet::with_capacity(subsections.len());

    for s in subsections.iter_mut() {
        if claimed.insert(s.id.clone()) {
            continue;
        }
        let mut n = 2;
        let mut candidate = format!("{}-{}", s.id, n);
        while seen.contains(&candidate) {
            n += 1;
            candidate = format!("{}-{}", s.id, n);
        }
        warn!(id = %s.id, replacement = %candidate, "duplicate subsection id");
        seen.insert(candidate.clone());
        claimed.insert(candidate.clone());
        s.id = candidate;
    }
    subsections
}
