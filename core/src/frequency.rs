use crate::cache::ResultCache;
use crate::document::{transliterate, Aggregate, Document};
use crate::error::{Result, ScoreError};
use crate::index::{CorpusIndex, DocId};
use crate::normalizer::Normalizer;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Canonical term -> occurrence count within one document.
pub type FrequencyTable = BTreeMap<String, u32>;

/// Per-document term counts plus the corpus statistics derived from them.
pub struct FrequencyIndex {
    normalizer: Arc<dyn Normalizer>,
    cache: ResultCache,
    corpus: CorpusIndex,
    documents: BTreeMap<DocId, Document>,
    /// Keyed by cache prefix, so two titles that transliterate alike cannot coexist.
    titles: HashMap<String, DocId>,
    next_id: DocId,
}

impl FrequencyIndex {
    pub fn new(normalizer: Arc<dyn Normalizer>, cache: ResultCache) -> Self {
        Self { normalizer, cache, corpus: CorpusIndex::new(), documents: BTreeMap::new(), titles: HashMap::new(), next_id: 0 }
    }

    /// Reassemble an index from persisted documents and their statistics.
    pub fn from_parts(normalizer: Arc<dyn Normalizer>, cache: ResultCache, documents: Vec<Document>, corpus: CorpusIndex) -> Self {
        let next_id = documents.iter().map(|d| d.id + 1).max().unwrap_or(0);
        let titles = documents.iter().map(|d| (d.cache_prefix(), d.id)).collect();
        let documents = documents.into_iter().map(|d| (d.id, d)).collect();
        Self { normalizer, cache, corpus, documents, titles, next_id }
    }

    pub fn normalizer(&self) -> &dyn Normalizer { self.normalizer.as_ref() }
    pub fn cache(&self) -> &ResultCache { &self.cache }
    pub fn corpus(&self) -> &CorpusIndex { &self.corpus }

    pub fn add_document(&mut self, title: impl Into<String>, text: impl Into<String>) -> Result<DocId> {
        let doc = Document::new(self.next_id, title, text)?;
        self.insert_document(doc)
    }

    /// Add a batch of `(title, text)` pairs. Nothing is indexed unless every
    /// document is valid and every title is free.
    pub fn add_documents<I, T, X>(&mut self, batch: I) -> Result<Vec<DocId>>
    where
        I: IntoIterator<Item = (T, X)>,
        T: Into<String>,
        X: Into<String>,
    {
        let mut docs = Vec::new();
        let mut prefixes = HashSet::new();
        for (offset, (title, text)) in batch.into_iter().enumerate() {
            let doc = Document::new(self.next_id + offset as DocId, title, text)?;
            let prefix = doc.cache_prefix();
            if self.titles.contains_key(&prefix) || !prefixes.insert(prefix) {
                return Err(ScoreError::DuplicateTitle(doc.title));
            }
            docs.push(doc);
        }
        docs.into_iter().map(|doc| self.insert_document(doc)).collect()
    }

    /// Index a document under its own id, e.g. one loaded from disk.
    pub fn insert_document(&mut self, doc: Document) -> Result<DocId> {
        let prefix = doc.cache_prefix();
        if self.titles.get(&prefix).is_some_and(|&holder| holder != doc.id) {
            return Err(ScoreError::DuplicateTitle(doc.title));
        }
        if self.documents.contains_key(&doc.id) {
            self.remove_document(doc.id)?;
        }
        // a persistent store may still hold aggregates of an earlier document with this prefix
        self.evict(&doc);
        let table = self.word_frequencies(&doc);
        self.corpus.insert(doc.id, table.keys().map(String::as_str));
        tracing::debug!(doc_id = doc.id, title = %doc.title, terms = table.len(), "document indexed");
        let id = doc.id;
        self.next_id = self.next_id.max(id + 1);
        self.titles.insert(prefix, id);
        self.documents.insert(id, doc);
        Ok(id)
    }

    /// Replace a document's text, evicting its cached aggregates and refreshing corpus statistics.
    pub fn update_document(&mut self, id: DocId, text: impl Into<String>) -> Result<()> {
        let current = self.documents.get(&id).ok_or(ScoreError::UnknownDocument(id))?;
        let doc = Document::new(id, current.title.clone(), text)?;
        self.evict(&doc);
        let table = self.word_frequencies(&doc);
        self.corpus.insert(id, table.keys().map(String::as_str));
        tracing::debug!(doc_id = id, terms = table.len(), "document updated");
        self.documents.insert(id, doc);
        Ok(())
    }

    pub fn remove_document(&mut self, id: DocId) -> Result<Document> {
        let doc = self.documents.remove(&id).ok_or(ScoreError::UnknownDocument(id))?;
        self.titles.remove(&doc.cache_prefix());
        self.corpus.remove(id);
        self.evict(&doc);
        tracing::debug!(doc_id = id, "document removed");
        Ok(doc)
    }

    /// Drop every cached aggregate of `doc`.
    pub fn evict(&self, doc: &Document) {
        for aggregate in Aggregate::ALL {
            self.cache.evict(&doc.cache_key(aggregate));
        }
    }

    pub fn document(&self, id: DocId) -> Result<&Document> {
        self.documents.get(&id).ok_or(ScoreError::UnknownDocument(id))
    }

    pub fn find_by_title(&self, title: &str) -> Option<&Document> {
        self.titles.get(&transliterate(title)).and_then(|id| self.documents.get(id)).filter(|d| d.title == title)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> { self.documents.values() }

    pub fn word_frequencies(&self, doc: &Document) -> FrequencyTable {
        self.cache.get_or_insert_with(&doc.cache_key(Aggregate::WordFrequencies), || {
            let mut table = FrequencyTable::new();
            for term in self.normalizer.content_terms(&doc.text) {
                *table.entry(term).or_insert(0) += 1;
            }
            table
        })
    }

    /// Occurrences of `term`'s canonical form among the content terms of `text`.
    ///
    /// Re-normalizes `text` on every call instead of reading a cached table, so it
    /// works on arbitrary fragments such as single sentences.
    pub fn tf(&self, term: &str, text: &str) -> u32 {
        self.tf_lemma(&self.normalizer.lemma(term), text)
    }

    pub(crate) fn tf_lemma(&self, lemma: &str, text: &str) -> u32 {
        self.normalizer.content_terms(text).iter().filter(|t| t.as_str() == lemma).count() as u32
    }

    pub fn tf_max(&self, doc: &Document) -> Result<u32> {
        self.cache.try_get_or_insert_with(&doc.cache_key(Aggregate::TfMax), || {
            self.word_frequencies(doc).values().copied().max().ok_or_else(|| ScoreError::empty_document(&doc.title))
        })
    }

    pub fn docs_count(&self) -> u32 { self.corpus.docs_count() }

    /// Documents containing `term` after canonicalization.
    pub fn df(&self, term: &str) -> u32 { self.corpus.df(&self.normalizer.lemma(term)) }

    pub(crate) fn df_lemma(&self, lemma: &str) -> u32 { self.corpus.df(lemma) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::MorphNormalizer;

    fn index() -> FrequencyIndex {
        FrequencyIndex::new(Arc::new(MorphNormalizer::new()), ResultCache::in_memory())
    }

    #[test]
    fn counts_content_terms_only() {
        let mut idx = index();
        let id = idx.add_document("d", "Кошка и собака. Кошки не спят!").unwrap();
        let doc = idx.document(id).unwrap();
        let table = idx.word_frequencies(doc);
        assert_eq!(table.get("кошк"), Some(&2));
        assert!(!table.contains_key("и"));
        assert!(!table.contains_key("не"));
        assert_eq!(idx.tf_max(doc).unwrap(), 2);
    }

    #[test]
    fn tf_on_empty_text_is_zero() {
        let idx = index();
        assert_eq!(idx.tf("кошка", ""), 0);
        assert_eq!(idx.tf("кошка", "Кошки, кошка, КОШКУ"), 3);
    }

    #[test]
    fn tf_max_fails_without_content() {
        let mut idx = index();
        let id = idx.add_document("empty", "и, а, но...").unwrap();
        let err = idx.tf_max(idx.document(id).unwrap()).unwrap_err();
        assert!(matches!(err, ScoreError::EmptyDocument { .. }));
    }

    #[test]
    fn duplicate_titles_are_rejected() {
        let mut idx = index();
        idx.add_document("same", "один").unwrap();
        assert!(matches!(idx.add_document("same", "два"), Err(ScoreError::DuplicateTitle(_))));
    }

    #[test]
    fn titles_colliding_after_transliteration_are_rejected() {
        let mut idx = index();
        idx.add_document("кот", "Кошка спит.").unwrap();
        assert!(matches!(idx.add_document("kot", "Собака лает."), Err(ScoreError::DuplicateTitle(t)) if t == "kot"));
        assert_eq!(idx.docs_count(), 1);
        assert!(idx.find_by_title("kot").is_none());
        assert_eq!(idx.find_by_title("кот").unwrap().id, 0);

        idx.remove_document(0).unwrap();
        let id = idx.add_document("kot", "Собака лает.").unwrap();
        assert_eq!(idx.df("собака"), 1);
        assert_eq!(idx.word_frequencies(idx.document(id).unwrap()).get("собак"), Some(&1));
    }

    #[test]
    fn rejected_batch_leaves_index_untouched() {
        let mut idx = index();
        idx.add_document("a", "Кошка спит.").unwrap();
        let dup_in_batch = vec![("b", "Собака лает."), ("b", "Птица поёт.")];
        assert!(matches!(idx.add_documents(dup_in_batch), Err(ScoreError::DuplicateTitle(_))));
        let dup_in_corpus = vec![("c", "Собака лает."), ("a", "Птица поёт.")];
        assert!(matches!(idx.add_documents(dup_in_corpus), Err(ScoreError::DuplicateTitle(_))));
        let too_long = vec![("d".to_string(), "Рыба.".to_string()), ("e".to_string(), "я".repeat(10_001))];
        assert!(matches!(idx.add_documents(too_long), Err(ScoreError::TooLong { .. })));
        assert_eq!(idx.docs_count(), 1);
        assert_eq!(idx.df("собака"), 0);

        let ids = idx.add_documents(vec![("b", "Собака лает."), ("c", "Птица поёт.")]).unwrap();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(idx.docs_count(), 3);
    }

    #[test]
    fn update_refreshes_statistics_and_cache() {
        let mut idx = index();
        let id = idx.add_document("d", "Кошка спит.").unwrap();
        idx.add_document("e", "Птица летает.").unwrap();
        assert_eq!(idx.df("кошка"), 1);
        idx.update_document(id, "Собака спит. Собака лает.").unwrap();
        assert_eq!(idx.df("кошка"), 0);
        assert_eq!(idx.df("собака"), 1);
        assert_eq!(idx.tf_max(idx.document(id).unwrap()).unwrap(), 2);
        assert_eq!(idx.docs_count(), 2);
    }

    #[test]
    fn remove_forgets_document() {
        let mut idx = index();
        let id = idx.add_document("d", "Кошка спит.").unwrap();
        idx.remove_document(id).unwrap();
        assert_eq!(idx.docs_count(), 0);
        assert_eq!(idx.df("кошка"), 0);
        assert!(idx.find_by_title("d").is_none());
        assert!(matches!(idx.document(id), Err(ScoreError::UnknownDocument(_))));
    }
}
