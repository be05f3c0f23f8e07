//! Shared provider response cache.
//!
//! Every key owns a [`OnceCell`]; concurrent requests for the same key wait on
//! the same cell, so only one fetch is in flight per key. A failed fetch
//! leaves the cell empty; the last caller to give up on it removes the key,
//! and the next request starts over.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mapping_types::Fragment;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult, ProviderError};
use crate::key::CacheKey;

type Slot = Arc<OnceCell<Arc<Fragment>>>;

/// Content-addressed store of provider fragments.
#[derive(Debug, Default)]
pub struct ProviderCache {
    root: Option<PathBuf>,
    slots: Mutex<HashMap<CacheKey, Slot>>,
    fetches: AtomicUsize,
}

impl ProviderCache {
    /// Memory-only cache.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Cache that also persists fragments as JSON under `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Number of fetches that actually reached a provider.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of populated keys.
    pub fn len(&self) -> CacheResult<usize> {
        let slots = self.slots.lock().map_err(|_| CacheError::LockPoisoned)?;
        Ok(slots.values().filter(|slot| slot.initialized()).count())
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Return the cached fragment for `key`, running `fetch` at most once
    /// across all concurrent callers.
    pub async fn get_or_fetch<F, Fut>(&self, key: CacheKey, fetch: F) -> CacheResult<Arc<Fragment>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Fragment, ProviderError>>,
    {
        let slot = {
            let mut slots = self.slots.lock().map_err(|_| CacheError::LockPoisoned)?;
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let outcome = slot
            .get_or_try_init(|| async {
                if let Some(fragment) = self.read_persisted(&key).await? {
                    debug!(key = %key, "Loaded fragment from disk cache");
                    return Ok::<_, CacheError>(Arc::new(fragment));
                }

                self.fetches.fetch_add(1, Ordering::SeqCst);
                debug!(key = %key, "Fetching fragment from provider");
                let fragment = fetch().await?;
                if let Err(e) = self.persist(&key, &fragment).await {
                    // The in-memory copy is still valid.
                    warn!(key = %key, error = %e, "Failed to persist fragment");
                }
                Ok(Arc::new(fragment))
            })
            .await
            .map(Arc::clone);

        if outcome.is_err() {
            self.forget_failed(&key, slot);
        }
        outcome
    }

    /// Drop `slot` and, when it was the last handle besides the map's own and
    /// is still empty, remove its entry. Waiters still holding the slot retry
    /// on it and clean up after themselves.
    fn forget_failed(&self, key: &CacheKey, slot: Slot) {
        let Ok(mut slots) = self.slots.lock() else {
            return;
        };
        let ours = Arc::as_ptr(&slot);
        drop(slot);
        let removable = slots.get(key).is_some_and(|current| {
            Arc::as_ptr(current) == ours
                && Arc::strong_count(current) == 1
                && !current.initialized()
        });
        if removable {
            slots.remove(key);
        }
    }

    fn path_for(&self, key: &CacheKey) -> Option<PathBuf> {
        self.root
            .as_ref()
            .map(|root| root.join(format!("{}.json", key.digest())))
    }

    async fn read_persisted(&self, key: &CacheKey) -> CacheResult<Option<Fragment>> {
        let Some(path) = self.path_for(key) else {
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, key: &CacheKey, fragment: &Fragment) -> CacheResult<()> {
        let Some(path) = self.path_for(key) else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, serde_json::to_vec(fragment)?).await?;
        Ok(())
    }
}
