// Document store contract — what the adapter consumes.
//
// One `DocumentStore` handle addresses one collection ("base"). Documents are
// schema-less attribute maps keyed by the `key` attribute. The only query is an
// exact-equality filter delivered in pages behind an opaque `last` cursor.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::AdapterResult;

/// Attribute holding the store's native key.
pub const KEY_ATTRIBUTE: &str = "key";

/// A document as the store sees it.
pub type RawDocument = serde_json::Map<String, Value>;

/// Attributes to set in a partial update.
pub type UpdatePatch = serde_json::Map<String, Value>;

// ─── Query ───────────────────────────────────────────────────────

/// Exact-equality filter over one or more attributes (logical AND).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Query(serde_json::Map<String, Value>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an `attribute == value` condition.
    pub fn eq(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(attribute.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Whether `doc` satisfies every condition. An empty query matches all.
    pub fn matches(&self, doc: &RawDocument) -> bool {
        self.conditions()
            .all(|(attribute, expected)| doc.get(attribute) == Some(expected))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (attribute, value) in self.conditions() {
            if !first {
                f.write_str(" AND ")?;
            }
            write!(f, "{attribute}={value}")?;
            first = false;
        }
        Ok(())
    }
}

// ─── Pagination ──────────────────────────────────────────────────

/// Options for one `fetch` round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum number of items the page may carry.
    pub limit: usize,
    /// Cursor returned by the previous page.
    pub last: Option<String>,
}

impl FetchOptions {
    pub fn first(limit: usize) -> Self {
        Self { limit, last: None }
    }

    pub fn after(limit: usize, last: impl Into<String>) -> Self {
        Self {
            limit,
            last: Some(last.into()),
        }
    }
}

/// One page of a scan. `last` is `None` once the scan is exhausted.
///
/// A page may be empty while `last` is still set: the store decides how much
/// it examines per round-trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchPage {
    pub items: Vec<RawDocument>,
    pub count: usize,
    pub last: Option<String>,
}

impl FetchPage {
    pub fn new(items: Vec<RawDocument>, last: Option<String>) -> Self {
        Self {
            count: items.len(),
            items,
            last,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.last.is_none()
    }
}

// ─── Store Traits ────────────────────────────────────────────────

/// A handle on one collection of the document store.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Insert or replace a document. Without a `key` attribute the store
    /// assigns one. Returns the stored document, `key` included.
    async fn put(&self, doc: RawDocument) -> AdapterResult<RawDocument>;

    /// Point lookup. Absence is `Ok(None)`.
    async fn get(&self, key: &str) -> AdapterResult<Option<RawDocument>>;

    /// Set the given attributes on an existing document.
    ///
    /// Fails with `StoreError::KeyNotFound` when `key` does not exist.
    async fn update(&self, patch: UpdatePatch, key: &str) -> AdapterResult<()>;

    /// Remove a document. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> AdapterResult<()>;

    /// One page of an attribute-filtered scan.
    async fn fetch(&self, query: &Query, options: FetchOptions) -> AdapterResult<FetchPage>;
}

/// Opens collections by name.
pub trait BaseProvider: Send + Sync {
    fn base(&self, name: &str) -> Arc<dyn DocumentStore>;
}
