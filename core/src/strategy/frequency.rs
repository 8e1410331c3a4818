use crate::document::Document;
use crate::error::{Result, ScoreError};
use crate::extract::SummaryExtractor;
use crate::normalizer::{tokens, Normalizer};
use crate::sentence::{split_sentences, ScoredSentence, SentenceScores};
use std::collections::{HashMap, HashSet};
use stop_words::{get, LANGUAGE};

/// Scores sentences by the summed relative frequency of their words.
///
/// Stop words are dropped before counting, each count is divided by the
/// largest one, and a sentence scores the sum over its word occurrences.
/// No corpus statistics are involved.
pub struct FrequencySummarizer {
    stop_words: HashSet<String>,
}

impl Default for FrequencySummarizer {
    fn default() -> Self { Self::new() }
}

impl FrequencySummarizer {
    pub fn new() -> Self {
        let mut stop_words: HashSet<String> = get(LANGUAGE::Russian).into_iter().collect();
        stop_words.extend(get(LANGUAGE::English));
        Self { stop_words }
    }

    pub fn with_stop_words<I: IntoIterator<Item = String>>(words: I) -> Self {
        Self { stop_words: words.into_iter().collect() }
    }

    fn is_stop_word(&self, token: &str) -> bool { self.stop_words.contains(&token.to_lowercase()) }

    pub fn sentence_scores(&self, normalizer: &dyn Normalizer, doc: &Document) -> Result<SentenceScores> {
        let mut counts: HashMap<String, u32> = HashMap::new();
        for token in tokens(&doc.text).filter(|t| !self.is_stop_word(t)) {
            let term = normalizer.parse(token);
            if term.is_content() {
                *counts.entry(term.lemma).or_insert(0) += 1;
            }
        }
        let max = counts.values().copied().max().ok_or_else(|| ScoreError::empty_document(&doc.title))?;
        let relative: HashMap<String, f64> = counts.into_iter().map(|(t, c)| (t, c as f64 / max as f64)).collect();

        let mut entries = Vec::new();
        for (index, sentence) in split_sentences(&doc.text).into_iter().enumerate() {
            let mut score = None;
            for term in normalizer.content_terms(sentence) {
                if let Some(f) = relative.get(&term) {
                    *score.get_or_insert(0.0) += f;
                }
            }
            if let Some(score) = score {
                entries.push(ScoredSentence { index, text: sentence.to_string(), score });
            }
        }
        Ok(SentenceScores::from_entries(entries))
    }

    pub fn summarize(&self, normalizer: &dyn Normalizer, doc: &Document, k: usize) -> Result<String> {
        let scores = self.sentence_scores(normalizer, doc)?;
        Ok(SummaryExtractor::new(k).summarize(&scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::MorphNormalizer;

    fn doc(text: &str) -> Document { Document::new(0, "t", text).unwrap() }

    #[test]
    fn frequent_words_lift_their_sentences() {
        let n = MorphNormalizer::new();
        let s = FrequencySummarizer::with_stop_words(Vec::new());
        let d = doc("Кошка спит. Кошка ест кошачий корм. Собака лает.");
        let scores = s.sentence_scores(&n, &d).unwrap();
        assert_eq!(scores.len(), 3);
        assert!(scores.get("Кошка ест кошачий корм").unwrap() > scores.get("Собака лает").unwrap());
        assert_eq!(s.summarize(&n, &d, 1).unwrap(), "Кошка ест кошачий корм");
    }

    #[test]
    fn stop_words_are_not_counted() {
        let n = MorphNormalizer::new();
        let s = FrequencySummarizer::with_stop_words(vec!["он".to_string()]);
        let scores = s.sentence_scores(&n, &doc("Он пришёл. Он ушёл. Он.")).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores.get("Он").is_none());
    }

    #[test]
    fn documents_without_content_fail() {
        let n = MorphNormalizer::new();
        let s = FrequencySummarizer::new();
        assert!(matches!(s.summarize(&n, &doc("и а но"), 3), Err(ScoreError::EmptyDocument { .. })));
    }
}
