// Collection wrapper — typed access to one store collection.
//
// Every document that leaves the store goes through `normalize`. The store has
// no unique or compound index, so `fetch_first` walks the paginated scan and
// stops at the first page that carries a match.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use deta_auth_core::db::models::Document;
use deta_auth_core::db::store::{DocumentStore, FetchOptions, Query};
use deta_auth_core::error::AdapterResult;

use crate::normalize::{normalize, normalize_opt, to_raw, to_update};

/// Typed handle on one collection holding documents of type `T`.
pub struct Collection<T> {
    name: String,
    store: Arc<dyn DocumentStore>,
    page_size: usize,
    debug_logs: bool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            store: Arc::clone(&self.store),
            page_size: self.page_size,
            debug_logs: self.debug_logs,
            _entity: PhantomData,
        }
    }
}

impl<T: Document> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("entity", &T::KIND)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl<T: Document> Collection<T> {
    pub fn new(name: impl Into<String>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            name: name.into(),
            store,
            page_size: 1,
            debug_logs: false,
            _entity: PhantomData,
        }
    }

    /// Scan page size used by `fetch_first`; values below 1 become 1.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_debug_logs(mut self, enabled: bool) -> Self {
        self.debug_logs = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert `doc` and return the stored entity.
    pub async fn put<D: Serialize + Sync>(&self, doc: &D) -> AdapterResult<T> {
        let raw = to_raw(doc)?;
        let stored: T = normalize(self.store.put(raw).await?)?;
        if self.debug_logs {
            tracing::debug!(
                "[Deta Adapter] PUT '{}' on '{}' ({})",
                stored.id(),
                self.name,
                T::KIND
            );
        }
        Ok(stored)
    }

    pub async fn get(&self, id: &str) -> AdapterResult<Option<T>> {
        if self.debug_logs {
            tracing::debug!("[Deta Adapter] GET '{}' on '{}'", id, self.name);
        }
        let raw = self.store.get(id).await?;
        normalize_opt(raw)
    }

    /// Send `patch` to the store, then merge it into `current` locally.
    ///
    /// The store is not read back: the result is `current` with the patch's
    /// fields applied, which matches the stored state as long as the store
    /// applies `set` attribute by attribute. With no `current` the update is
    /// still issued and `None` is returned.
    pub async fn update(
        &self,
        current: Option<T>,
        patch: &T::Patch,
        id: &str,
    ) -> AdapterResult<Option<T>> {
        let set = to_update(patch)?;
        if self.debug_logs {
            tracing::debug!(
                "[Deta Adapter] UPDATE '{}' on '{}' ({} attributes)",
                id,
                self.name,
                set.len()
            );
        }
        self.store.update(set, id).await?;

        Ok(current.map(|mut doc| {
            doc.merge(patch);
            doc
        }))
    }

    /// Delete by id. Deleting a missing id succeeds.
    pub async fn delete(&self, id: &str) -> AdapterResult<()> {
        if self.debug_logs {
            tracing::debug!("[Deta Adapter] DELETE '{}' on '{}'", id, self.name);
        }
        self.store.delete(id).await
    }

    /// First document matching every condition of `query`.
    ///
    /// One round-trip per scan page until a page carries a match or the store
    /// stops returning a cursor.
    pub async fn fetch_first(&self, query: &Query) -> AdapterResult<Option<T>> {
        let mut options = FetchOptions::first(self.page_size);
        let mut round_trips = 0usize;

        loop {
            round_trips += 1;
            let page = self.store.fetch(query, options).await?;

            if page.count > 0 {
                if let Some(first) = page.items.into_iter().next() {
                    if self.debug_logs {
                        tracing::debug!(
                            "[Deta Adapter] FETCH_FIRST on '{}' where {} matched after {} round-trip(s)",
                            self.name,
                            query,
                            round_trips
                        );
                    }
                    return normalize(first).map(Some);
                }
            }

            match page.last {
                Some(last) => options = FetchOptions::after(self.page_size, last),
                None => {
                    if self.debug_logs {
                        tracing::debug!(
                            "[Deta Adapter] FETCH_FIRST on '{}' where {} exhausted after {} round-trip(s)",
                            self.name,
                            query,
                            round_trips
                        );
                    }
                    return Ok(None);
                }
            }
        }
    }
}
