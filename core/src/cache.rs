//! Time-bounded memoization of per-document aggregates.
//!
//! Values are stored as bincode bytes behind a [`CacheStore`], so the store can
//! live in process memory or on disk. A failing or corrupt store never fails a
//! request: the value is recomputed and the problem logged.

use anyhow::Result;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default, Clone)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn new(start_millis: u64) -> Self { Self(Arc::new(AtomicU64::new(start_millis))) }
    pub fn advance(&self, by: Duration) { self.0.fetch_add(by.as_millis() as u64, Ordering::SeqCst); }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 { self.0.load(Ordering::SeqCst) }
}

/// Key-value store with per-entry expiry. Expired entries read as absent.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    expires_at: u64,
    value: Vec<u8>,
}

fn expiry(clock: &dyn Clock, ttl: Duration) -> u64 { clock.now_millis().saturating_add(ttl.as_millis() as u64) }

pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Box<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self { Self::new() }
}

impl MemoryStore {
    pub fn new() -> Self { Self::with_clock(SystemClock) }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self { entries: Mutex::new(HashMap::new()), clock: Box::new(clock) }
    }

    pub fn len(&self) -> usize { self.entries.lock().len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(e) if e.expires_at > now => return Ok(Some(e.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }
        entries.remove(key);
        Ok(None)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let expires_at = expiry(self.clock.as_ref(), ttl);
        self.entries.lock().insert(key.to_string(), Entry { expires_at, value });
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Persistent store on a sled tree; the expiry travels with each value.
pub struct SledStore {
    db: sled::Db,
    clock: Box<dyn Clock>,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self { db: sled::open(path)?, clock: Box::new(SystemClock) })
    }

    pub fn temporary() -> Result<Self> {
        Ok(Self { db: sled::Config::new().temporary(true).open()?, clock: Box::new(SystemClock) })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }
}

impl CacheStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(raw) = self.db.get(key)? else { return Ok(None) };
        let entry: Entry = bincode::deserialize(&raw)?;
        if entry.expires_at <= self.clock.now_millis() {
            self.db.remove(key)?;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let entry = Entry { expires_at: expiry(self.clock.as_ref(), ttl), value };
        self.db.insert(key, bincode::serialize(&entry)?)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db.remove(key)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
}

pub struct ResultCache {
    store: Box<dyn CacheStore>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl ResultCache {
    pub fn new(store: impl CacheStore + 'static, ttl: Duration) -> Self { Self::boxed(Box::new(store), ttl) }

    pub fn boxed(store: Box<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl, hits: AtomicU64::new(0), misses: AtomicU64::new(0), errors: AtomicU64::new(0) }
    }

    pub fn in_memory() -> Self { Self::new(MemoryStore::new(), DEFAULT_TTL) }

    pub fn ttl(&self) -> Duration { self.ttl }

    pub fn get_or_insert_with<T, F>(&self, key: &str, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.try_get_or_insert_with(key, || Ok::<T, Infallible>(compute())) {
            Ok(v) => v,
            Err(never) => match never {},
        }
    }

    /// Return the cached value for `key`, or compute and store it. Failed computations are not cached.
    pub fn try_get_or_insert_with<T, E, F>(&self, key: &str, compute: F) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        match self.store.get(key) {
            Ok(Some(bytes)) => match bincode::deserialize::<T>(&bytes) {
                Ok(v) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(v);
                }
                Err(e) => {
                    self.errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(key, error = %e, "undecodable cache entry, recomputing");
                }
            },
            Ok(None) => {}
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key, error = %e, "cache store unavailable, recomputing");
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key, "cache miss");
        let value = compute()?;
        let stored = bincode::serialize(&value).map_err(anyhow::Error::from).and_then(|b| self.store.set(key, b, self.ttl));
        if let Err(e) = stored {
            self.errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(key, error = %e, "failed to store cache entry");
        }
        Ok(value)
    }

    pub fn evict(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            self.errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(key, error = %e, "failed to evict cache entry");
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}
