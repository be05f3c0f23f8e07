use std::sync::Arc;

use mapping_types::{Fragment, Release};

use crate::error::CacheResult;
use crate::key::CacheKey;
use crate::provider::MappingProvider;
use crate::store::ProviderCache;

/// A provider whose responses go through a shared [`ProviderCache`].
#[derive(Clone)]
pub struct CachedProvider {
    inner: Arc<dyn MappingProvider>,
    cache: Arc<ProviderCache>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn MappingProvider>, cache: Arc<ProviderCache>) -> Self {
        Self { inner, cache }
    }

    pub fn id(&self) -> &str {
        self.inner.id()
    }

    pub fn key(&self, release: &Release) -> CacheKey {
        CacheKey::new(self.inner.id(), release.id.clone(), self.inner.resource())
    }

    /// Fetch `release`, coalescing with any in-flight request for the same key.
    pub async fn fetch(&self, release: &Release) -> CacheResult<Arc<Fragment>> {
        let inner = Arc::clone(&self.inner);
        self.cache
            .get_or_fetch(self.key(release), || async move { inner.fetch(release).await })
            .await
    }
}

impl std::fmt::Debug for CachedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedProvider")
            .field("provider", &self.inner.id())
            .field("cache", &self.cache)
            .finish()
    }
}
