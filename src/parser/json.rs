use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PipelineConfig;

static FENCED_JSON_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)```json[ \t]*\r?\n?(.*?)```").unwrap());
static FENCED_ANY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)```").unwrap());
static TRAILING_COMMA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\s*[}\]])").unwrap());

const FAILURE_MESSAGE: &str = "Failed to parse JSON from AI response";

/// Which recovery step produced the value, safest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Direct,
    FencedJson,
    FencedAny,
    BracketSpan,
    TrailingCommaRepair,
    OuterBraces,
}

/// Failure shape, chosen by sniffing the input for what the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    EmptyInput,
    Challenges,
    Subsections,
    Generic,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::EmptyInput => "empty-input",
            FailureKind::Challenges => "challenge-parse-failure",
            FailureKind::Subsections => "subsection-parse-failure",
            FailureKind::Generic => "parse-failure",
        }
    }

    fn sniff(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("challenge") {
            FailureKind::Challenges
        } else if lower.contains("subsection") {
            FailureKind::Subsections
        } else {
            FailureKind::Generic
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionFailure {
    pub error_kind: FailureKind,
    /// Leading characters of the input, for diagnostics.
    pub raw_sample: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Recovered { value: Value, strategy: Strategy },
    Failed(ExtractionFailure),
}

impl ExtractionResult {
    pub fn value(&self) -> Option<&Value> {
        match self {
            ExtractionResult::Recovered { value, .. } => Some(value),
            ExtractionResult::Failed(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            ExtractionResult::Recovered { value, .. } => Some(value),
            ExtractionResult::Failed(_) => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ExtractionResult::Recovered { .. })
    }

    /// `{ok: true, value}` or `{ok: false, errorKind, rawSample}`.
    pub fn to_value(&self) -> Value {
        match self {
            ExtractionResult::Recovered { value, .. } => json!({ "ok": true, "value": value }),
            ExtractionResult::Failed(f) => json!({
                "ok": false,
                "errorKind": f.error_kind.as_str(),
                "rawSample": f.raw_sample,
            }),
        }
    }

    /// The parsed value, or the caller-shaped stand-in a UI can render
    /// directly: `{challenges: [], ...}`, `{subsections: [], ...}` or a bare
    /// `{error, rawResponse}`.
    pub fn fallback_value(&self) -> Value {
        match self {
            ExtractionResult::Recovered { value, .. } => value.clone(),
            ExtractionResult::Failed(f) => match f.error_kind {
                FailureKind::Challenges => json!({
                    "challenges": [],
                    "error": FAILURE_MESSAGE,
                    "rawResponse": f.raw_sample,
                }),
                FailureKind::Subsections => json!({
                    "subsections": [],
                    "error": FAILURE_MESSAGE,
                    "rawResponse": f.raw_sample,
                }),
                FailureKind::EmptyInput | FailureKind::Generic => json!({
                    "error": FAILURE_MESSAGE,
                    "rawResponse": f.raw_sample,
                }),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON could be recovered ({kind}): {raw_sample:?}")]
    NotFound {
        kind: FailureKind,
        raw_sample: String,
    },
    #[error("recovered JSON has an unexpected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Recover one JSON value from free text, trying progressively more
/// permissive strategies. Never panics; exhausting every strategy yields
/// `ExtractionResult::Failed`.
pub fn extract_json(text: &str, config: &PipelineConfig) -> ExtractionResult {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return fail(FailureKind::EmptyInput, text, config);
    }

    if let Some(value) = parse(trimmed) {
        return recovered(value, Strategy::Direct);
    }

    // The most recent candidate is what the repair pass works on.
    let mut candidate: Option<&str> = None;

    if let Some(inner) = capture(&FENCED_JSON_RE, trimmed) {
        candidate = Some(inner);
        if let Some(value) = parse(inner) {
            return recovered(value, Strategy::FencedJson);
        }
    }

    if let Some(inner) = capture(&FENCED_ANY_RE, trimmed) {
        candidate = Some(inner);
        if let Some(value) = parse(inner) {
            return recovered(value, Strategy::FencedAny);
        }
    }

    if let Some(span) = first_object_span(trimmed) {
        candidate = Some(span);
        if let Some(value) = parse(span) {
            return recovered(value, Strategy::BracketSpan);
        }
    }

    let repaired = repair(candidate.unwrap_or(trimmed));
    if let Some(value) = parse(&repaired) {
        return recovered(value, Strategy::TrailingCommaRepair);
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Some(value) = parse(&text[start..=end]) {
                return recovered(value, Strategy::OuterBraces);
            }
        }
    }

    fail(FailureKind::sniff(text), text, config)
}

/// Recover JSON and deserialize it into `T`.
pub fn extract_typed<T: DeserializeOwned>(text: &str, config: &PipelineConfig) -> Result<T, ExtractError> {
    match extract_json(text, config) {
        ExtractionResult::Recovered { value, .. } => Ok(serde_json::from_value(value)?),
        ExtractionResult::Failed(f) => Err(ExtractError::NotFound {
            kind: f.error_kind,
            raw_sample: f.raw_sample,
        }),
    }
}

fn parse(s: &str) -> Option<Value> {
    serde_json::from_str(s.trim()).ok()
}

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().trim())
}

fn repair(candidate: &str) -> String {
    TRAILING_COMMA_RE.replace_all(candidate, "$1").into_owned()
}

/// The first brace-balanced `{...}` span, skipping braces inside strings.
fn first_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

fn recovered(value: Value, strategy: Strategy) -> ExtractionResult {
    debug!(?strategy, "recovered JSON");
    ExtractionResult::Recovered { value, strategy }
}

fn fail(kind: FailureKind, text: &str, config: &PipelineConfig) -> ExtractionResult {
    let raw_sample: String = text.chars().take(config.raw_sample_chars).collect();
    warn!(error_kind = %kind, len = text.len(), "JSON extraction failed");
    ExtractionResult::Failed(ExtractionFailure {
        error_kind: kind,
        raw_sample,
    })
}

// ── Tests ──
