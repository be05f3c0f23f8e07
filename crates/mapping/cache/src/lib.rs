//! # mapping-cache
//!
//! The seam between the engine and external provider adapters.
//!
//! - [`MappingProvider`]: one data provider; yields a [`Fragment`] per release
//! - [`ProviderCache`]: shared read path keyed by `(provider, release, resource)`
//!   with at most one in-flight fetch per key
//! - [`CachedProvider`]: a provider bound to a shared cache
//!
//! [`Fragment`]: mapping_types::Fragment

pub mod cached;
pub mod error;
pub mod key;
pub mod provider;
pub mod store;

pub use cached::CachedProvider;
pub use error::{CacheError, CacheResult, ProviderError};
pub use key::CacheKey;
pub use provider::{MappingProvider, StaticProvider};
pub use store::ProviderCache;
