use crate::document::Document;
use crate::error::{Result, ScoreError};
use crate::frequency::FrequencyIndex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdfMode {
    /// ln(N / df); a term found in every document weighs 0.
    #[default]
    Classic,
    /// ln(1 + N / df)
    Smoothed,
}

/// Augmented term frequency times inverse document frequency:
///
/// `w(t, d) = 0.5 * (1 + tf(t, d) / tf_max(d)) * idf(t)`
pub struct TermWeighter<'a> {
    index: &'a FrequencyIndex,
    idf: IdfMode,
}

impl<'a> TermWeighter<'a> {
    pub fn new(index: &'a FrequencyIndex, idf: IdfMode) -> Self { Self { index, idf } }

    pub fn index(&self) -> &'a FrequencyIndex { self.index }

    pub fn w(&self, term: &str, doc: &Document) -> Result<f64> {
        self.weight_lemma(&self.index.normalizer().lemma(term), doc)
    }

    pub fn idf(&self, term: &str) -> Result<f64> { self.idf_lemma(&self.index.normalizer().lemma(term)) }

    pub(crate) fn weight_lemma(&self, lemma: &str, doc: &Document) -> Result<f64> {
        let idf = self.idf_lemma(lemma)?;
        let tf_max = self.index.tf_max(doc)?;
        // Same count as tf(term, doc.text), read from the cached table.
        let tf = self.index.word_frequencies(doc).get(lemma).copied().unwrap_or(0);
        Ok(0.5 * (1.0 + tf as f64 / tf_max as f64) * idf)
    }

    pub(crate) fn idf_lemma(&self, lemma: &str) -> Result<f64> {
        let n = self.index.docs_count();
        if n == 0 {
            return Err(ScoreError::EmptyCorpus);
        }
        let df = self.index.df_lemma(lemma);
        if df == 0 {
            return Err(ScoreError::TermNotInCorpus { term: lemma.to_string() });
        }
        let ratio = n as f64 / df as f64;
        Ok(match self.idf {
            IdfMode::Classic => ratio.ln(),
            IdfMode::Smoothed => (1.0 + ratio).ln(),
        })
    }
}
