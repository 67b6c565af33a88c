pub mod blocks;
pub mod fields;
pub mod json;
pub mod key_points;
pub mod normalize;
pub mod pages;
pub mod sections;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::model::{PayloadKind, RawModule, RawPayload, RawSubsection, Subsection};
use crate::policy::{ContentPolicy, DefaultPolicy};
use json::ExtractionResult;
use normalize::{dedupe_ids, Normalizer};

const RECORD_KEYS: &[&str] = &["title", "content", "summary", "keyPoints", "pages"];

/// Who a payload belongs to. `subsection_id`/`title` apply to single
/// subsection payloads; `index` is the position used for fallback ids.
#[derive(Debug, Clone, Default)]
pub struct PayloadContext {
    pub module_id: String,
    pub subsection_id: Option<String>,
    pub title: Option<String>,
    pub index: usize,
}

impl PayloadContext {
    pub fn module(module_id: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            ..Default::default()
        }
    }
}

/// Config plus heuristics; every call is pure and can run on any thread.
#[derive(Debug, Clone)]
pub struct Pipeline<P = DefaultPolicy> {
    config: PipelineConfig,
    policy: P,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            policy: DefaultPolicy,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl<P: ContentPolicy> Pipeline<P> {
    pub fn with_policy(config: PipelineConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> Normalizer<'_> {
        Normalizer::new(&self.config, &self.policy)
    }

    /// Route a payload to its extractor:
    /// module markdown → segmenter, subsection markdown → labeled fields,
    /// AI response → JSON records, falling back to labeled fields.
    pub fn process(&self, payload: &RawPayload, ctx: &PayloadContext) -> Vec<Subsection> {
        let n = self.normalizer();
        match payload.kind {
            PayloadKind::ModuleMarkdown => n.module_markdown(&payload.text, &ctx.module_id),
            PayloadKind::SubsectionMarkdown => vec![self.subsection_markdown(&payload.text, ctx)],
            PayloadKind::AiResponse => self.ai_response(&payload.text, ctx),
        }
    }

    pub fn process_module(&self, module: &RawModule) -> Vec<Subsection> {
        self.normalizer().module(module)
    }

    pub fn extract_json(&self, text: &str) -> ExtractionResult {
        json::extract_json(text, &self.config)
    }

    fn subsection_markdown(&self, text: &str, ctx: &PayloadContext) -> Subsection {
        self.normalizer().subsection_markdown(
            text,
            ctx.title.as_deref(),
            ctx.subsection_id.as_deref(),
            &ctx.module_id,
            ctx.index,
        )
    }

    fn ai_response(&self, text: &str, ctx: &PayloadContext) -> Vec<Subsection> {
        let records = self.extract_json(text).into_value().and_then(raw_records);

        let Some(mut records) = records else {
            debug!(module_id = %ctx.module_id, "no JSON records in AI response, reading labeled markdown");
            return vec![self.subsection_markdown(text, ctx)];
        };

        if let [only] = records.as_mut_slice() {
            if only.id.is_none() {
                only.id = ctx.subsection_id.clone();
            }
            if only.title.is_none() {
                only.title = ctx.title.clone();
            }
        }

        let n = self.normalizer();
        let subsections = records
            .iter()
            .enumerate()
            .map(|(i, r)| n.raw(r, &ctx.module_id, ctx.index + i))
            .collect();
        dedupe_ids(subsections)
    }
}

/// Subsection-shaped records inside a recovered JSON value: a bare array,
/// `{subsections: [...]}`, or a single record object.
fn raw_records(value: Value) -> Option<Vec<RawSubsection>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("subsections") {
            Some(Value::Array(items)) => items,
            _ if RECORD_KEYS.iter().any(|k| map.contains_key(*k)) => vec![Value::Object(map)],
            _ => return None,
        },
        _ => return None,
    };

    let records: Vec<RawSubsection> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "skipping malformed subsection record");
                None
            }
        })
        .collect();

    (!records.is_empty()).then_some(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::default()
    }

    fn ctx() -> PayloadContext {
        PayloadContext {
            module_id: "rust-101".into(),
            subsection_id: Some("sub-1".into()),
            title: Some("Ownership".into()),
            index: 0,
        }
    }

    #[test]
    fn module_markdown_routes_to_segmenter() {
        let p = RawPayload::new(PayloadKind::ModuleMarkdown, "#### A\nx\n\n#### B\ny");
        let subs = pipeline().process(&p, &PayloadContext::module("m"));
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[1].id, "b");
    }

    #[test]
    fn subsection_markdown_returns_one_record() {
        let p = RawPayload::new(PayloadKind::SubsectionMarkdown, "**Summary:** Moves and borrows.");
        let subs = pipeline().process(&p, &ctx());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "sub-1");
        assert_eq!(subs[0].title, "Ownership");
        assert_eq!(subs[0].summary, "Moves and borrows.");
    }

    #[test]
    fn ai_response_with_json_records() {
        let text = "Here are the subsections:\n```json\n{\"subsections\": [\
                    {\"title\": \"Borrowing\", \"content\": \"Refs.\\n\\nMore refs.\"},\
                    {\"title\": \"Slices\", \"summary\": \"Views\", \"keyPoints\": [], \
                     \"pages\": [{\"pageTitle\": \"Slices\", \"content\": \"&v[..]\"}]}\
                    ]}\n```";
        let p = RawPayload::new(PayloadKind::AiResponse, text);
        let subs = pipeline().process(&p, &PayloadContext::module("m"));
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].id, "borrowing");
        assert_eq!(subs[0].pages.len(), 1);
        assert_eq!(subs[1].summary, "Views");
        assert_eq!(subs[1].pages[0].page_number, 1);
    }

    #[test]
    fn single_ai_record_inherits_context() {
        let p = RawPayload::new(PayloadKind::AiResponse, r#"{"content": "Body text."}"#);
        let subs = pipeline().process(&p, &ctx());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "sub-1");
        assert_eq!(subs[0].title, "Ownership");
    }

    #[test]
    fn ai_response_without_json_reads_labeled_markdown() {
        let text = "**Summary:**\nBorrowing without owning.\n\n#### Shared refs\nMany readers.";
        let p = RawPayload::new(PayloadKind::AiResponse, text);
        let subs = pipeline().process(&p, &ctx());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].summary, "Borrowing without owning.");
        assert_eq!(subs[0].pages[0].page_title, "Shared refs");
    }

    #[test]
    fn unrelated_json_is_not_a_record() {
        assert!(raw_records(serde_json::json!({"challenges": []})).is_none());
        assert!(raw_records(serde_json::json!(42)).is_none());
        assert!(raw_records(serde_json::json!([{"title": 5}])).is_none());
    }

    #[test]
    fn empty_module_payload_yields_nothing() {
        let p = RawPayload::new(PayloadKind::ModuleMarkdown, "   ");
        assert!(pipeline().process(&p, &PayloadContext::module("m")).is_empty());
    }
}
