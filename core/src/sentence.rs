use crate::document::Document;
use crate::error::{Result, ScoreError};
use crate::normalizer::is_punctuation;
use crate::weight::TermWeighter;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]\s").expect("valid regex");
}

/// What happens when two sentences normalize to the same text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// The later sentence's score replaces the earlier one, keeping the earlier position.
    #[default]
    LastWins,
    /// Every sentence keeps its own entry, keyed by (index, text).
    KeepAll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSentence {
    /// Position among the document's candidate sentences.
    pub index: usize,
    pub text: String,
    pub score: f64,
}

/// Sentence scores in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentenceScores {
    entries: Vec<ScoredSentence>,
}

impl SentenceScores {
    pub fn from_entries(entries: Vec<ScoredSentence>) -> Self { Self { entries } }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredSentence> { self.entries.iter() }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, text: &str) -> Option<f64> {
        self.entries.iter().rev().find(|s| s.text == text).map(|s| s.score)
    }
}

impl<'a> IntoIterator for &'a SentenceScores {
    type Item = &'a ScoredSentence;
    type IntoIter = std::slice::Iter<'a, ScoredSentence>;
    fn into_iter(self) -> Self::IntoIter { self.entries.iter() }
}

/// Candidate sentences of `text`: split after `.`, `!` or `?` followed by
/// whitespace, trimmed of punctuation and whitespace, empty pieces dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_END
        .split(text)
        .map(|s| s.trim_matches(|c: char| is_punctuation(c) || c.is_whitespace()))
        .filter(|s| !s.is_empty())
        .collect()
}

pub struct SentenceScorer<'a> {
    weighter: TermWeighter<'a>,
    collisions: CollisionPolicy,
}

impl<'a> SentenceScorer<'a> {
    pub fn new(weighter: TermWeighter<'a>, collisions: CollisionPolicy) -> Self { Self { weighter, collisions } }

    /// Sum of `tf(t, sentence) * w(t, doc)` over the distinct content terms of the sentence.
    pub fn score(&self, sentence: &str, doc: &Document) -> Result<f64> {
        let index = self.weighter.index();
        let mut counts: HashMap<String, u32> = HashMap::new();
        for term in index.normalizer().content_terms(sentence) {
            *counts.entry(term).or_insert(0) += 1;
        }
        let mut score = 0.0;
        for (lemma, tf) in counts {
            score += tf as f64 * self.weighter.weight_lemma(&lemma, doc)?;
        }
        Ok(score)
    }

    /// Fails with `EmptyDocument` when `doc` has no content terms at all.
    pub fn sentence_scores(&self, doc: &Document) -> Result<SentenceScores> {
        self.weighter.index().tf_max(doc)?;
        let mut entries: Vec<ScoredSentence> = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (index, text) in split_sentences(&doc.text).into_iter().enumerate() {
            let score = self.score(text, doc)?;
            let existing = match self.collisions {
                CollisionPolicy::LastWins => seen.get(text).copied(),
                CollisionPolicy::KeepAll => None,
            };
            if let Some(slot) = existing {
                entries[slot].score = score;
                continue;
            }
            seen.insert(text, entries.len());
            entries.push(ScoredSentence { index, text: text.to_string(), score });
        }
        tracing::debug!(doc_id = doc.id, sentences = entries.len(), "scored sentences");
        Ok(SentenceScores { entries })
    }
}

/// `1 - offset / len`, with both measured in characters; first occurrence only.
pub fn posd(sentence: &str, text: &str) -> Result<f64> {
    let total = text.chars().count();
    let byte_offset = match text.find(sentence) {
        Some(off) if total > 0 => off,
        _ => return Err(ScoreError::undefined_position(sentence)),
    };
    let offset = text[..byte_offset].chars().count();
    Ok(1.0 - offset as f64 / total as f64)
}

/// `posd` within the first blank-line separated paragraph that contains the sentence.
pub fn posp(sentence: &str, text: &str) -> Result<f64> {
    let paragraph = text
        .split("\n\n")
        .find(|p| p.contains(sentence))
        .ok_or_else(|| ScoreError::undefined_position(sentence))?;
    posd(sentence, paragraph)
}

pub fn positions(sentence: &str, text: &str) -> Result<(f64, f64)> {
    Ok((posd(sentence, text)?, posp(sentence, text)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation_followed_by_space() {
        let s = split_sentences("Первое предложение. Второе!\nТретье? «Четвёртое»...");
        assert_eq!(s, vec!["Первое предложение", "Второе", "Третье", "Четвёртое"]);
    }

    #[test]
    fn decimal_points_do_not_split() {
        assert_eq!(split_sentences("Цена 3.5 рубля. Дёшево."), vec!["Цена 3.5 рубля", "Дёшево"]);
    }

    #[test]
    fn blank_pieces_are_dropped() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("... !!! ").is_empty());
    }

    #[test]
    fn position_measures_from_document_start() {
        let text = "abcd efgh";
        assert_eq!(posd("abcd", text).unwrap(), 1.0);
        assert!((posd("efgh", text).unwrap() - (1.0 - 5.0 / 9.0)).abs() < 1e-12);
    }

    #[test]
    fn paragraph_position_is_local() {
        let text = "Первый абзац.\n\nВторой абзац. Конец.";
        let (d, p) = positions("Конец", text).unwrap();
        assert!(p > d);
        assert!((p - (1.0 - 14.0 / 20.0)).abs() < 1e-12);
    }

    #[test]
    fn missing_sentences_have_no_position() {
        assert!(matches!(posd("нет", "текст"), Err(ScoreError::UndefinedPosition { .. })));
        assert!(matches!(posd("", ""), Err(ScoreError::UndefinedPosition { .. })));
        assert!(matches!(posp("нет", "a\n\nb"), Err(ScoreError::UndefinedPosition { .. })));
    }
}
