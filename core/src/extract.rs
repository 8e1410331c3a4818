use crate::sentence::{ScoredSentence, SentenceScores};
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;

pub const DEFAULT_TOP_K: usize = 10;

lazy_static! {
    static ref NEWLINES: Regex = Regex::new(r"\n+").expect("valid regex");
}

/// Picks the highest scoring sentences. Ties go to the sentence that appears first.
#[derive(Debug, Clone, Copy)]
pub struct SummaryExtractor {
    pub k: usize,
}

impl Default for SummaryExtractor {
    fn default() -> Self { Self { k: DEFAULT_TOP_K } }
}

impl SummaryExtractor {
    pub fn new(k: usize) -> Self { Self { k } }

    /// At most `k` entries, best first.
    pub fn ranked<'s>(&self, scores: &'s SentenceScores) -> Vec<&'s ScoredSentence> {
        let mut ranked: Vec<&ScoredSentence> = scores.iter().collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then(a.index.cmp(&b.index)));
        ranked.truncate(self.k);
        ranked
    }

    pub fn extract<'s>(&self, scores: &'s SentenceScores) -> Vec<&'s str> {
        self.ranked(scores).into_iter().map(|s| s.text.as_str()).collect()
    }

    pub fn summarize(&self, scores: &SentenceScores) -> String { assemble(&self.extract(scores)) }
}

/// Join sentences with single spaces, collapsing newline runs.
pub fn assemble(sentences: &[&str]) -> String {
    NEWLINES.replace_all(&sentences.join(" "), " ").into_owned()
}
