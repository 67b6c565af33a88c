/// Tunables shared by every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Paragraphs grouped onto one page by the paginator.
    pub paragraphs_per_page: usize,
    pub max_key_points: usize,
    /// Sentences kept when no line qualifies as a key point.
    pub fallback_sentences: usize,
    /// Sentences must be strictly longer than this to count as a key point.
    pub min_sentence_chars: usize,
    /// Upper bound on pages synthesized from heading-less subsection markdown.
    pub max_synthetic_pages: usize,
    /// Length of the raw sample carried by failed JSON extractions.
    pub raw_sample_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paragraphs_per_page: 2,
            max_key_points: 5,
            fallback_sentences: 3,
            min_sentence_chars: 20,
            max_synthetic_pages: 3,
            raw_sample_chars: 200,
        }
    }
}

impl PipelineConfig {
    /// Zero-sized limits would break the "at least one page" invariant, so
    /// they are clamped to 1.
    pub fn with_paragraphs_per_page(mut self, n: usize) -> Self {
        self.paragraphs_per_page = n.max(1);
        self
    }

    pub fn with_max_key_points(mut self, n: usize) -> Self {
        self.max_key_points = n;
        self
    }

    pub fn with_max_synthetic_pages(mut self, n: usize) -> Self {
        self.max_synthetic_pages = n.max(1);
        self
    }
}
