//! Extractive summarization over a document corpus.
//!
//! Sentences are scored by summing TF-IDF style term weights computed against
//! corpus-wide document frequencies, and the best ones make up the summary.

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod frequency;
pub mod index;
pub mod keywords;
pub mod normalizer;
pub mod persist;
pub mod sentence;
pub mod strategy;
pub mod summarizer;
pub mod weight;

pub use cache::{CacheStore, MemoryStore, ResultCache, SledStore};
pub use config::SummarizerConfig;
pub use document::Document;
pub use error::{Result, ScoreError};
pub use extract::SummaryExtractor;
pub use frequency::{FrequencyIndex, FrequencyTable};
pub use index::{CorpusIndex, DocId, TermId};
pub use normalizer::{MorphNormalizer, NormalizedTerm, Normalizer, PartOfSpeech};
pub use sentence::{CollisionPolicy, SentenceScorer, SentenceScores};
pub use strategy::Strategy;
pub use summarizer::Summarizer;
pub use weight::{IdfMode, TermWeighter};
