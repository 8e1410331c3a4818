//! Error taxonomy for scoring and summarization.
//!
//! Every variant is terminal for the request that raised it: scoring is
//! deterministic, so retrying yields the same failure.

use crate::index::DocId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoreError>;

#[derive(Debug, Error)]
pub enum ScoreError {
    /// No content-bearing terms survive normalization, so `tf_max` is undefined.
    #[error("document {title:?} has no content-bearing terms")]
    EmptyDocument { title: String },

    /// `docs_count() == 0`, inverse document frequency is undefined.
    #[error("corpus is empty, inverse document frequency is undefined")]
    EmptyCorpus,

    /// `df(term) == 0`, the term would get an infinite weight.
    #[error("term {term:?} does not occur in any document of the corpus")]
    TermNotInCorpus { term: String },

    /// Position metrics could not find the sentence verbatim.
    #[error("sentence {sentence:?} cannot be located in its document")]
    UndefinedPosition { sentence: String },

    #[error("unknown document {0}")]
    UnknownDocument(DocId),

    #[error("a document titled {0:?} already exists")]
    DuplicateTitle(String),

    #[error("document {field} exceeds {limit} characters")]
    TooLong { field: &'static str, limit: usize },

    #[error("unknown summarization strategy {0:?}")]
    UnknownStrategy(String),
}

impl ScoreError {
    pub fn empty_document(title: impl Into<String>) -> Self {
        Self::EmptyDocument { title: title.into() }
    }

    pub fn undefined_position(sentence: impl Into<String>) -> Self {
        Self::UndefinedPosition { sentence: sentence.into() }
    }
}
