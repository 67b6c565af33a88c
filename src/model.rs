use serde::{Deserialize, Serialize};

// ── Inbound payloads ──

/// Which extractor a raw text blob is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadKind {
    ModuleMarkdown,
    SubsectionMarkdown,
    AiResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawPayload {
    pub kind: PayloadKind,
    pub text: String,
}

impl RawPayload {
    pub fn new(kind: PayloadKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// A subsection as delivered by upstream collaborators. Any field may be
/// missing; already-structured records carry `pages` and `summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSubsection {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub key_points: Option<Vec<String>>,
    pub pages: Option<Vec<Page>>,
    pub difficulty: Option<String>,
    pub estimated_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawModule {
    pub id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub subsections: Vec<RawSubsection>,
}

// ── Canonical content model ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub page_number: usize,
    pub page_title: String,
    pub content: String,
    pub key_takeaway: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// Invariant: `pages` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subsection {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub pages: Vec<Page>,
    pub difficulty: Difficulty,
    pub estimated_time: String,
}
