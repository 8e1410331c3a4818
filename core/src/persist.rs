use crate::cache::ResultCache;
use crate::document::Document;
use crate::frequency::FrequencyIndex;
use crate::index::CorpusIndex;
use crate::normalizer::Normalizer;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;

/// Bumped whenever the normalizer or the on-disk layout changes; older
/// dictionaries are then rebuilt from the stored documents.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn now(num_docs: u32) -> Self {
        let created_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        Self { num_docs, created_at, version: FORMAT_VERSION }
    }
}

pub struct StorePaths {
    pub root: PathBuf,
}

impl StorePaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn dictionary(&self) -> PathBuf { self.root.join("dictionary.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    pub fn exists(&self) -> bool { self.meta().is_file() }
}

fn write_bincode<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let bytes = bincode::serialize(value)?;
    f.write_all(&bytes)?;
    Ok(())
}

fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

pub fn save_documents(paths: &StorePaths, docs: &[Document]) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bincode(&paths.docs(), &docs)
}

pub fn load_documents(paths: &StorePaths) -> Result<Vec<Document>> { read_bincode(&paths.docs()) }

pub fn save_dictionary(paths: &StorePaths, index: &CorpusIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bincode(&paths.dictionary(), index)
}

pub fn load_dictionary(paths: &StorePaths) -> Result<CorpusIndex> { read_bincode(&paths.dictionary()) }

pub fn save_meta(paths: &StorePaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &StorePaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write documents, corpus statistics and metadata.
pub fn save_index(paths: &StorePaths, index: &FrequencyIndex) -> Result<()> {
    let docs: Vec<Document> = index.documents().cloned().collect();
    save_documents(paths, &docs)?;
    save_dictionary(paths, index.corpus())?;
    save_meta(paths, &MetaFile::now(index.docs_count()))?;
    tracing::info!(root = %paths.root.display(), num_docs = docs.len(), "store saved");
    Ok(())
}

/// Load a saved store. The dictionary is trusted only if it was written by the
/// current format version and agrees with the documents; otherwise the
/// statistics are recomputed from the texts.
pub fn load_index(paths: &StorePaths, normalizer: Arc<dyn Normalizer>, cache: ResultCache) -> Result<FrequencyIndex> {
    let meta = load_meta(paths)?;
    let docs = load_documents(paths)?;
    if meta.version == FORMAT_VERSION {
        if let Ok(corpus) = load_dictionary(paths) {
            if corpus.docs_count() as usize == docs.len() && docs.iter().all(|d| corpus.contains(d.id)) {
                tracing::info!(num_docs = docs.len(), created_at = %meta.created_at, "store loaded");
                return Ok(FrequencyIndex::from_parts(normalizer, cache, docs, corpus));
            }
        }
    }
    tracing::warn!(version = meta.version, "stale dictionary, rebuilding corpus statistics");
    let mut index = FrequencyIndex::new(normalizer, cache);
    for doc in docs {
        index.insert_document(doc)?;
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::MorphNormalizer;
    use tempfile::tempdir;

    fn fresh() -> FrequencyIndex { FrequencyIndex::new(Arc::new(MorphNormalizer::new()), ResultCache::in_memory()) }

    #[test]
    fn saved_store_round_trips_statistics() {
        let dir = tempdir().unwrap();
        let paths = StorePaths::new(dir.path());
        let mut idx = fresh();
        idx.add_document("d1", "Кошка спит.").unwrap();
        idx.add_document("d2", "Кошка ест.").unwrap();
        save_index(&paths, &idx).unwrap();
        assert!(paths.exists());

        let loaded = load_index(&paths, Arc::new(MorphNormalizer::new()), ResultCache::in_memory()).unwrap();
        assert_eq!(loaded.docs_count(), 2);
        assert_eq!(loaded.df("кошка"), 2);
        assert_eq!(loaded.find_by_title("d2").unwrap().id, 1);
    }

    #[test]
    fn outdated_dictionary_is_rebuilt() {
        let dir = tempdir().unwrap();
        let paths = StorePaths::new(dir.path());
        let mut idx = fresh();
        idx.add_document("d1", "Кошка спит.").unwrap();
        save_index(&paths, &idx).unwrap();
        save_meta(&paths, &MetaFile { num_docs: 1, created_at: String::new(), version: 0 }).unwrap();
        save_dictionary(&paths, &CorpusIndex::new()).unwrap();

        let loaded = load_index(&paths, Arc::new(MorphNormalizer::new()), ResultCache::in_memory()).unwrap();
        assert_eq!(loaded.df("кошка"), 1);
    }
}
