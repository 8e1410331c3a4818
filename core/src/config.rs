use crate::extract::DEFAULT_TOP_K;
use crate::sentence::CollisionPolicy;
use crate::strategy::TextRankConfig;
use crate::weight::IdfMode;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for scoring and summarization.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
/// Environment variables override the file:
/// `ESSAY_TOP_K`, `ESSAY_KEYWORDS`, `ESSAY_CACHE_TTL_SECS`, `ESSAY_IDF`, `ESSAY_COLLISIONS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Sentences per summary
    pub top_k: usize,
    pub keyword_count: usize,
    pub cache_ttl_secs: u64,
    pub idf: IdfMode,
    pub collisions: CollisionPolicy,
    pub textrank: TextRankConfig,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            keyword_count: 10,
            cache_ttl_secs: 300,
            idf: IdfMode::default(),
            collisions: CollisionPolicy::default(),
            textrank: TextRankConfig::default(),
        }
    }
}

impl SummarizerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::from_json_file(p)?,
            None => Self::default(),
        };
        base.apply_vars(|key| std::env::var(key).ok())
    }

    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ESSAY_TOP_K") {
            self.top_k = v.trim().parse().context("ESSAY_TOP_K")?;
        }
        if let Some(v) = lookup("ESSAY_KEYWORDS") {
            self.keyword_count = v.trim().parse().context("ESSAY_KEYWORDS")?;
        }
        if let Some(v) = lookup("ESSAY_CACHE_TTL_SECS") {
            self.cache_ttl_secs = v.trim().parse().context("ESSAY_CACHE_TTL_SECS")?;
        }
        if let Some(v) = lookup("ESSAY_IDF") {
            self.idf = parse_name(&v).context("ESSAY_IDF")?;
        }
        if let Some(v) = lookup("ESSAY_COLLISIONS") {
            self.collisions = parse_name(&v).context("ESSAY_COLLISIONS")?;
        }
        Ok(self)
    }

    pub fn cache_ttl(&self) -> Duration { Duration::from_secs(self.cache_ttl_secs) }
}

/// Parse a unit enum variant by its serialized name, e.g. `"smoothed"`.
fn parse_name<T: DeserializeOwned>(name: &str) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::String(name.trim().to_string()))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: SummarizerConfig = serde_json::from_str(r#"{"top_k": 3, "idf": "smoothed"}"#).unwrap();
        assert_eq!(cfg.top_k, 3);
        assert_eq!(cfg.idf, IdfMode::Smoothed);
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(300));
        assert_eq!(cfg.collisions, CollisionPolicy::LastWins);
    }

    #[test]
    fn variables_override_values() {
        let vars: HashMap<&str, &str> =
            [("ESSAY_TOP_K", "5"), ("ESSAY_COLLISIONS", "keep-all"), ("ESSAY_CACHE_TTL_SECS", "60")].into();
        let cfg = SummarizerConfig::default().apply_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.top_k, 5);
        assert_eq!(cfg.collisions, CollisionPolicy::KeepAll);
        assert_eq!(cfg.cache_ttl_secs, 60);
    }

    #[test]
    fn bad_values_are_reported() {
        let err = SummarizerConfig::default().apply_vars(|k| (k == "ESSAY_IDF").then(|| "bm25".to_string())).unwrap_err();
        assert!(format!("{err:#}").contains("ESSAY_IDF"));
    }
}
