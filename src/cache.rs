//! Two-tier key/value cache with per-entry TTL.
//!
//! Reads check a bounded in-memory LRU first, then fall back to a
//! namespace-scoped JSON document on disk; disk hits are promoted back
//! into memory. Writes go through to both tiers so a restart only loses
//! entries that were memory-only and already expired. Disk failures are
//! logged and degrade to a miss, never an error.

use chrono::Utc;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// A cached value with its write and expiry instants (unix ms).
///
/// Invariant: `timestamp <= expiry`; a read past `expiry` behaves as a
/// miss and evicts the entry from whichever tier served it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    pub timestamp: i64,
    pub expiry: i64,
}

impl CacheEntry {
    fn new(data: Value, ttl_ms: i64) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            data,
            timestamp: now,
            expiry: now.saturating_add(ttl_ms.max(0)),
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expiry
    }
}

/// Memory + disk cache. The memory tier is shared across namespaces and
/// bounded; each namespace owns one JSON document on disk.
pub struct TieredCache {
    memory: RwLock<LruCache<String, CacheEntry>>,
    /// Serializes disk read-modify-write cycles
    disk: Mutex<()>,
    dir: PathBuf,
}

impl TieredCache {
    pub fn new(dir: impl AsRef<Path>, max_memory_entries: usize) -> Self {
        let capacity =
            NonZeroUsize::new(max_memory_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            memory: RwLock::new(LruCache::new(capacity)),
            disk: Mutex::new(()),
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn memory_key(namespace: &str, key: &str) -> String {
        format!("{namespace}:{key}")
    }

    fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.json"))
    }

    /// Look up a value, consulting memory then disk. Expired entries are
    /// purged from the tier that held them and reported as a miss.
    pub async fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let mem_key = Self::memory_key(namespace, key);
        let now = Utc::now().timestamp_millis();

        {
            let mut memory = self.memory.write().await;
            if let Some(entry) = memory.get(&mem_key) {
                if entry.is_expired(now) {
                    debug!(namespace, key, "evicting expired memory entry");
                    memory.pop(&mem_key);
                } else {
                    return Some(entry.data.clone());
                }
            }
        }

        let _guard = self.disk.lock().await;
        let mut document = self.load_namespace(namespace).await;
        let entry = document.get(key)?.clone();
        if entry.is_expired(now) {
            debug!(namespace, key, "purging expired disk entry");
            document.remove(key);
            self.store_namespace(namespace, &document).await;
            return None;
        }

        // Promote the disk hit back into memory
        self.memory.write().await.put(mem_key, entry.clone());
        Some(entry.data)
    }

    /// Write-through set. Both tiers always receive the same entry, so a
    /// key never holds two different expiry times across tiers.
    pub async fn set(&self, namespace: &str, key: &str, value: Value, ttl_ms: i64) {
        let entry = CacheEntry::new(value, ttl_ms);

        self.memory
            .write()
            .await
            .put(Self::memory_key(namespace, key), entry.clone());

        let _guard = self.disk.lock().await;
        let mut document = self.load_namespace(namespace).await;
        document.insert(key.to_string(), entry);
        self.store_namespace(namespace, &document).await;
    }

    pub async fn delete(&self, namespace: &str, key: &str) {
        self.memory
            .write()
            .await
            .pop(&Self::memory_key(namespace, key));

        let _guard = self.disk.lock().await;
        let mut document = self.load_namespace(namespace).await;
        if document.remove(key).is_some() {
            self.store_namespace(namespace, &document).await;
        }
    }

    /// Drop every entry in a namespace from both tiers.
    pub async fn clear_namespace(&self, namespace: &str) {
        let prefix = format!("{namespace}:");
        {
            let mut memory = self.memory.write().await;
            let keys: Vec<String> = memory
                .iter()
                .map(|(k, _)| k.clone())
                .filter(|k| k.starts_with(&prefix))
                .collect();
            for k in keys {
                memory.pop(&k);
            }
        }

        let _guard = self.disk.lock().await;
        let path = self.namespace_path(namespace);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(namespace, error = %e, "failed to remove namespace document");
            }
        }
    }

    /// Current number of entries in the memory tier
    pub async fn memory_len(&self) -> usize {
        self.memory.read().await.len()
    }

    async fn load_namespace(&self, namespace: &str) -> HashMap<String, CacheEntry> {
        let path = self.namespace_path(namespace);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(namespace, error = %e, "corrupt namespace document, treating as empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(namespace, error = %e, "failed to read namespace document");
                HashMap::new()
            }
        }
    }

    async fn store_namespace(&self, namespace: &str, document: &HashMap<String, CacheEntry>) {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(namespace, error = %e, "failed to create cache directory");
            return;
        }
        let path = self.namespace_path(namespace);
        match serde_json::to_string(document) {
            Ok(raw) => {
                if let Err(e) = tokio::fs::write(&path, raw).await {
                    warn!(namespace, error = %e, "failed to write namespace document");
                }
            }
            Err(e) => warn!(namespace, error = %e, "failed to serialize namespace document"),
        }
    }
}
