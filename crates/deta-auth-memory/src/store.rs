// In-memory document store — BTreeMap-backed collections implementing the
// core DocumentStore contract.
//
// Documents are kept in key order. A scan examines at most `scan_window`
// documents per call and reports the last examined key as the cursor, so a
// page can come back empty while the scan is still incomplete.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use deta_auth_core::db::store::{
    BaseProvider, DocumentStore, FetchOptions, FetchPage, Query, RawDocument, UpdatePatch,
    KEY_ATTRIBUTE,
};
use deta_auth_core::error::{AdapterResult, StoreError};
use deta_auth_core::utils::generate_key;

/// Documents examined per scan call unless configured otherwise.
pub const DEFAULT_SCAN_WINDOW: usize = 1000;

/// One in-memory collection.
///
/// Clones share the same data and counters.
#[derive(Debug, Clone)]
pub struct MemoryBase {
    name: String,
    docs: Arc<RwLock<BTreeMap<String, RawDocument>>>,
    scan_window: usize,
    fetch_calls: Arc<AtomicUsize>,
}

impl MemoryBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_scan_window(name, DEFAULT_SCAN_WINDOW)
    }

    /// Create a collection whose scans examine at most `scan_window` documents
    /// per round-trip.
    pub fn with_scan_window(name: impl Into<String>, scan_window: usize) -> Self {
        Self {
            name: name.into(),
            docs: Arc::new(RwLock::new(BTreeMap::new())),
            scan_window: scan_window.max(1),
            fetch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of `fetch` round-trips served so far.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Raw stored documents, in key order.
    pub async fn snapshot(&self) -> Vec<RawDocument> {
        self.docs.read().await.values().cloned().collect()
    }
}

fn take_key(doc: &mut RawDocument) -> AdapterResult<String> {
    match doc.remove(KEY_ATTRIBUTE) {
        None | Some(Value::Null) => Ok(generate_key()),
        Some(Value::String(key)) if !key.is_empty() => Ok(key),
        Some(other) => Err(StoreError::request(
            400,
            format!("key must be a non-empty string, got {other}"),
        )),
    }
}

#[async_trait]
impl DocumentStore for MemoryBase {
    async fn put(&self, mut doc: RawDocument) -> AdapterResult<RawDocument> {
        let key = take_key(&mut doc)?;
        doc.insert(KEY_ATTRIBUTE.to_string(), Value::String(key.clone()));

        tracing::trace!(base = %self.name, %key, "put");
        self.docs.write().await.insert(key, doc.clone());
        Ok(doc)
    }

    async fn get(&self, key: &str) -> AdapterResult<Option<RawDocument>> {
        Ok(self.docs.read().await.get(key).cloned())
    }

    async fn update(&self, patch: UpdatePatch, key: &str) -> AdapterResult<()> {
        if patch.contains_key(KEY_ATTRIBUTE) {
            return Err(StoreError::request(400, "key cannot be updated"));
        }

        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(key)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))?;
        for (attribute, value) in patch {
            doc.insert(attribute, value);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> AdapterResult<()> {
        self.docs.write().await.remove(key);
        Ok(())
    }

    async fn fetch(&self, query: &Query, options: FetchOptions) -> AdapterResult<FetchPage> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let limit = options.limit.max(1);
        let start = match options.last {
            Some(last) => Bound::Excluded(last),
            None => Bound::Unbounded,
        };

        let docs = self.docs.read().await;
        let mut range = docs.range::<String, _>((start, Bound::Unbounded)).peekable();

        let mut items = Vec::new();
        let mut examined = 0usize;
        let mut last_examined = None;
        while let Some((key, doc)) = range.next() {
            examined += 1;
            last_examined = Some(key.clone());
            if query.matches(doc) {
                items.push(doc.clone());
            }
            if items.len() >= limit || examined >= self.scan_window {
                break;
            }
        }

        let last = if range.peek().is_some() {
            last_examined
        } else {
            None
        };

        tracing::trace!(
            base = %self.name,
            examined,
            matched = items.len(),
            more = last.is_some(),
            "fetch"
        );
        Ok(FetchPage::new(items, last))
    }
}

// ─── Provider ────────────────────────────────────────────────────

/// In-memory stand-in for a store project: hands out one shared
/// `MemoryBase` per collection name.
#[derive(Debug, Clone)]
pub struct MemoryDeta {
    bases: Arc<Mutex<HashMap<String, MemoryBase>>>,
    scan_window: usize,
}

impl Default for MemoryDeta {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDeta {
    pub fn new() -> Self {
        Self::with_scan_window(DEFAULT_SCAN_WINDOW)
    }

    /// Every collection opened from this provider uses `scan_window`.
    pub fn with_scan_window(scan_window: usize) -> Self {
        Self {
            bases: Arc::new(Mutex::new(HashMap::new())),
            scan_window,
        }
    }

    /// The concrete collection behind `name`, created on first use.
    pub fn collection(&self, name: &str) -> MemoryBase {
        let mut bases = self.bases.lock().unwrap_or_else(PoisonError::into_inner);
        bases
            .entry(name.to_string())
            .or_insert_with(|| MemoryBase::with_scan_window(name, self.scan_window))
            .clone()
    }

    /// Total `fetch` round-trips across all collections.
    pub fn fetch_calls(&self) -> usize {
        let bases = self.bases.lock().unwrap_or_else(PoisonError::into_inner);
        bases.values().map(MemoryBase::fetch_calls).sum()
    }
}

impl BaseProvider for MemoryDeta {
    fn base(&self, name: &str) -> Arc<dyn DocumentStore> {
        Arc::new(self.collection(name))
    }
}
