pub mod cache;
pub mod config;
pub mod model;
pub mod parser;
pub mod policy;

pub use cache::{ContentCache, RequestToken};
pub use config::PipelineConfig;
pub use model::{Difficulty, Page, PayloadKind, RawModule, RawPayload, RawSubsection, Section, Subsection};
pub use parser::json::{extract_json, extract_typed, ExtractError, ExtractionResult};
pub use parser::{PayloadContext, Pipeline};
pub use policy::{ContentPolicy, DefaultPolicy};
