use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub type TermId = u32;
pub type DocId = u32;

/// Corpus-wide statistics: document count and, per term, the number of
/// documents containing it. Updated incrementally as documents come and go,
/// so `df` never rescans the corpus.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CorpusIndex {
    pub dictionary: HashMap<String, TermId>,
    pub df: Vec<u32>,
    pub doc_terms: HashMap<DocId, Vec<TermId>>, // distinct terms per document, sorted
    pub num_docs: u32,
}

impl CorpusIndex {
    pub fn new() -> Self { Self::default() }

    /// Record `doc_id` as containing `terms`. Re-inserting a document replaces its previous terms.
    pub fn insert<'a, I>(&mut self, doc_id: DocId, terms: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.remove(doc_id);
        let mut ids = BTreeSet::new();
        for term in terms {
            let next = self.dictionary.len() as TermId;
            let tid = *self.dictionary.entry(term.to_string()).or_insert(next);
            if self.df.len() <= tid as usize { self.df.resize(tid as usize + 1, 0); }
            ids.insert(tid);
        }
        for &tid in &ids { self.df[tid as usize] += 1; }
        self.doc_terms.insert(doc_id, ids.into_iter().collect());
        self.num_docs += 1;
    }

    pub fn remove(&mut self, doc_id: DocId) -> bool {
        let Some(ids) = self.doc_terms.remove(&doc_id) else { return false };
        for tid in ids {
            let slot = &mut self.df[tid as usize];
            *slot = slot.saturating_sub(1);
        }
        self.num_docs = self.num_docs.saturating_sub(1);
        true
    }

    pub fn contains(&self, doc_id: DocId) -> bool { self.doc_terms.contains_key(&doc_id) }

    /// Number of documents containing the canonical term; 0 for unseen terms.
    pub fn df(&self, term: &str) -> u32 {
        self.dictionary.get(term).and_then(|&tid| self.df.get(tid as usize)).copied().unwrap_or(0)
    }

    pub fn docs_count(&self) -> u32 { self.num_docs }

    /// Terms currently present in at least one document.
    pub fn num_terms(&self) -> usize { self.df.iter().filter(|&&d| d > 0).count() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn df_counts_documents_not_occurrences() {
        let mut idx = CorpusIndex::new();
        idx.insert(0, ["кошк", "спит", "кошк"]);
        idx.insert(1, ["кошк", "ест"]);
        assert_eq!(idx.docs_count(), 2);
        assert_eq!(idx.df("кошк"), 2);
        assert_eq!(idx.df("спит"), 1);
        assert_eq!(idx.df("собак"), 0);
    }

    #[test]
    fn reinsert_and_remove_keep_df_bounded() {
        let mut idx = CorpusIndex::new();
        idx.insert(0, ["a", "b"]);
        idx.insert(0, ["b", "c"]);
        assert_eq!(idx.docs_count(), 1);
        assert_eq!(idx.df("a"), 0);
        assert_eq!(idx.df("c"), 1);
        assert!(idx.remove(0));
        assert!(!idx.remove(0));
        assert_eq!(idx.docs_count(), 0);
        assert_eq!(idx.num_terms(), 0);
    }
}
