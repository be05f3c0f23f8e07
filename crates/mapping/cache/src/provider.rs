use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mapping_types::{Fragment, Release};

use crate::error::ProviderError;

/// One external source of mappings.
///
/// Adapters own fetching and parsing of their provider's format; the engine
/// only sees the resulting [`Fragment`].
#[async_trait]
pub trait MappingProvider: Send + Sync {
    /// Stable identifier, part of the cache key.
    fn id(&self) -> &str;

    /// Resource name within the provider, part of the cache key.
    fn resource(&self) -> &str {
        "mappings"
    }

    async fn fetch(&self, release: &Release) -> Result<Fragment, ProviderError>;
}

/// Provider serving fragments from memory.
///
/// Used for embedding pre-parsed data and in tests.
#[derive(Debug, Default)]
pub struct StaticProvider {
    id: String,
    fragments: HashMap<String, Fragment>,
    fetches: AtomicUsize,
}

impl StaticProvider {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fragments: HashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, release: impl Into<String>, fragment: Fragment) -> Self {
        self.fragments.insert(release.into(), fragment);
        self
    }

    /// Number of `fetch` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MappingProvider for StaticProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, release: &Release) -> Result<Fragment, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fragments
            .get(&release.id)
            .cloned()
            .ok_or_else(|| ProviderError::Unavailable {
                provider: self.id.clone(),
                release: release.id.clone(),
            })
    }
}
