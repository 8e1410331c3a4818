use crate::cache::{CacheStore, MemoryStore, ResultCache};
use crate::config::SummarizerConfig;
use crate::document::Document;
use crate::error::Result;
use crate::extract::SummaryExtractor;
use crate::frequency::FrequencyIndex;
use crate::index::DocId;
use crate::keywords;
use crate::normalizer::{MorphNormalizer, Normalizer};
use crate::sentence::{SentenceScorer, SentenceScores};
use crate::strategy::{textrank, FrequencySummarizer, Strategy};
use crate::weight::TermWeighter;
use std::sync::Arc;
use std::time::Instant;

/// Entry point tying the corpus, the scoring pipeline and the strategies together.
pub struct Summarizer {
    index: FrequencyIndex,
    config: SummarizerConfig,
    frequency: FrequencySummarizer,
}

impl Summarizer {
    pub fn new(config: SummarizerConfig, normalizer: Arc<dyn Normalizer>, store: Box<dyn CacheStore>) -> Self {
        let cache = ResultCache::boxed(store, config.cache_ttl());
        Self::from_index(config, FrequencyIndex::new(normalizer, cache))
    }

    /// Default normalizer and an in-process cache.
    pub fn in_memory(config: SummarizerConfig) -> Self {
        Self::new(config, Arc::new(MorphNormalizer::new()), Box::new(MemoryStore::new()))
    }

    pub fn from_index(config: SummarizerConfig, index: FrequencyIndex) -> Self {
        Self { index, config, frequency: FrequencySummarizer::new() }
    }

    pub fn config(&self) -> &SummarizerConfig { &self.config }
    pub fn index(&self) -> &FrequencyIndex { &self.index }
    pub fn index_mut(&mut self) -> &mut FrequencyIndex { &mut self.index }

    pub fn add_document(&mut self, title: impl Into<String>, text: impl Into<String>) -> Result<DocId> {
        self.index.add_document(title, text)
    }

    /// All-or-nothing batch insert, see [`FrequencyIndex::add_documents`].
    pub fn add_documents<I, T, X>(&mut self, batch: I) -> Result<Vec<DocId>>
    where
        I: IntoIterator<Item = (T, X)>,
        T: Into<String>,
        X: Into<String>,
    {
        self.index.add_documents(batch)
    }

    pub fn weighter(&self) -> TermWeighter<'_> { TermWeighter::new(&self.index, self.config.idf) }

    pub fn scorer(&self) -> SentenceScorer<'_> { SentenceScorer::new(self.weighter(), self.config.collisions) }

    pub fn extractor(&self) -> SummaryExtractor { SummaryExtractor::new(self.config.top_k) }

    pub fn sentence_scores(&self, id: DocId) -> Result<SentenceScores> {
        self.scorer().sentence_scores(self.index.document(id)?)
    }

    pub fn summarize(&self, id: DocId, strategy: Strategy) -> Result<String> {
        self.summarize_document(self.index.document(id)?, strategy)
    }

    /// `doc` must belong to the corpus for the `Own` strategy, whose weights need its terms' document frequencies.
    pub fn summarize_document(&self, doc: &Document, strategy: Strategy) -> Result<String> {
        let start = Instant::now();
        let k = self.config.top_k;
        let normalizer = self.index.normalizer();
        let summary = match strategy {
            Strategy::Own => self.extractor().summarize(&self.scorer().sentence_scores(doc)?),
            Strategy::Frequency => self.frequency.summarize(normalizer, doc, k)?,
            Strategy::TextRank => textrank::summarize(normalizer, doc, k, &self.config.textrank)?,
        };
        tracing::info!(doc_id = doc.id, %strategy, chars = summary.chars().count(), took_s = start.elapsed().as_secs_f64(), "summary built");
        Ok(summary)
    }

    pub fn keywords(&self, id: DocId, count: usize) -> Result<Vec<String>> {
        keywords::keywords(&self.weighter(), self.index.document(id)?, count)
    }
}
