//! Sentence-level TextRank.
//!
//! Sentences are nodes, edges are weighted by normalized content-term overlap,
//! and PageRank with power iteration ranks the nodes. The summary keeps the
//! selected sentences in document order.

use crate::document::Document;
use crate::error::{Result, ScoreError};
use crate::extract::{assemble, SummaryExtractor};
use crate::normalizer::Normalizer;
use crate::sentence::{split_sentences, ScoredSentence, SentenceScores};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextRankConfig {
    /// Damping factor (typically 0.85)
    pub damping: f64,
    pub max_iterations: usize,
    /// L1 convergence threshold
    pub threshold: f64,
}

impl Default for TextRankConfig {
    fn default() -> Self { Self { damping: 0.85, max_iterations: 100, threshold: 1e-6 } }
}

/// Overlap similarity: shared terms over the log sizes of both sentences.
fn similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let shared = a.intersection(b).count();
    if shared == 0 {
        return 0.0;
    }
    shared as f64 / ((1.0 + a.len() as f64).ln() + (1.0 + b.len() as f64).ln())
}

/// Power iteration over a dense, symmetric weight matrix. Nodes without
/// edges spread their mass uniformly.
fn pagerank(weights: &[Vec<f64>], config: &TextRankConfig) -> Vec<f64> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }
    let totals: Vec<f64> = weights.iter().map(|row| row.iter().sum()).collect();
    let teleport = (1.0 - config.damping) / n as f64;
    let mut scores = vec![1.0 / n as f64; n];
    let mut next = vec![0.0; n];
    let mut iterations = 0;
    let mut delta = f64::MAX;

    while iterations < config.max_iterations && delta > config.threshold {
        iterations += 1;
        let dangling: f64 = (0..n).filter(|&i| totals[i] == 0.0).map(|i| scores[i]).sum();
        next.fill(teleport + config.damping * dangling / n as f64);
        for (i, row) in weights.iter().enumerate() {
            if totals[i] == 0.0 {
                continue;
            }
            for (j, &w) in row.iter().enumerate() {
                if w > 0.0 {
                    next[j] += config.damping * scores[i] * w / totals[i];
                }
            }
        }
        delta = scores.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
        std::mem::swap(&mut scores, &mut next);
    }
    tracing::trace!(iterations, delta, "textrank converged");
    scores
}

pub fn sentence_scores(normalizer: &dyn Normalizer, doc: &Document, config: &TextRankConfig) -> Result<SentenceScores> {
    let sentences = split_sentences(&doc.text);
    let terms: Vec<HashSet<String>> = sentences.iter().map(|s| normalizer.content_terms(s).into_iter().collect()).collect();
    if terms.iter().all(HashSet::is_empty) {
        return Err(ScoreError::empty_document(&doc.title));
    }
    let n = sentences.len();
    let mut weights = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let w = similarity(&terms[i], &terms[j]);
            weights[i][j] = w;
            weights[j][i] = w;
        }
    }
    let ranks = pagerank(&weights, config);
    let entries = sentences
        .into_iter()
        .zip(ranks)
        .enumerate()
        .map(|(index, (text, score))| ScoredSentence { index, text: text.to_string(), score })
        .collect();
    Ok(SentenceScores::from_entries(entries))
}

pub fn summarize(normalizer: &dyn Normalizer, doc: &Document, k: usize, config: &TextRankConfig) -> Result<String> {
    let scores = sentence_scores(normalizer, doc, config)?;
    let mut picked = SummaryExtractor::new(k).ranked(&scores);
    picked.sort_by_key(|s| s.index);
    let texts: Vec<&str> = picked.iter().map(|s| s.text.as_str()).collect();
    Ok(assemble(&texts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::MorphNormalizer;

    #[test]
    fn ranks_sum_to_one() {
        let w = vec![vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 1.0], vec![0.0, 1.0, 0.0]];
        let r = pagerank(&w, &TextRankConfig::default());
        assert!((r.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(r[1] > r[0]);
        assert!((r[0] - r[2]).abs() < 1e-12);
    }

    #[test]
    fn isolated_sentences_share_mass_evenly() {
        let w = vec![vec![0.0; 2]; 2];
        let r = pagerank(&w, &TextRankConfig::default());
        assert!(r.iter().all(|x| (x - 0.5).abs() < 1e-12));
    }

    #[test]
    fn central_sentence_wins_and_order_is_preserved() {
        let n = MorphNormalizer::new();
        let doc = Document::new(
            0,
            "t",
            "Кошка ловит мышь. Погода сегодня хорошая. Кошка и мышь живут в доме. Мышь боится кошку.",
        )
        .unwrap();
        let scores = sentence_scores(&n, &doc, &TextRankConfig::default()).unwrap();
        let best = scores.iter().max_by(|a, b| a.score.partial_cmp(&b.score).unwrap()).unwrap();
        assert_ne!(best.text, "Погода сегодня хорошая");
        let summary = summarize(&n, &doc, 2, &TextRankConfig::default()).unwrap();
        assert!(!summary.contains("Погода"));
    }
}
