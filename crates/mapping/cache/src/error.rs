use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Failures reported by provider adapters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider {provider} has no data for release {release}")]
    Unavailable { provider: String, release: String },

    #[error("provider {provider} failed to fetch release {release}: {message}")]
    Fetch {
        provider: String,
        release: String,
        message: String,
    },

    #[error("provider {provider} returned unparseable data for release {release}: {message}")]
    Parse {
        provider: String,
        release: String,
        message: String,
    },
}

/// Errors from the provider cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache lock poisoned")]
    LockPoisoned,
}
