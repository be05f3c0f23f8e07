use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of one provider response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub provider: String,
    pub release: String,
    pub resource: String,
}

impl CacheKey {
    pub fn new(
        provider: impl Into<String>,
        release: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            release: release.into(),
            resource: resource.into(),
        }
    }

    /// Content address of this key (BLAKE3, hex).
    ///
    /// Components are NUL-separated so `("ab", "c")` and `("a", "bc")` differ.
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.provider.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.release.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.resource.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.provider, self.release, self.resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_and_separates_components() {
        let a = CacheKey::new("ab", "c", "m");
        let b = CacheKey::new("a", "bc", "m");
        assert_eq!(a.digest(), CacheKey::new("ab", "c", "m").digest());
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }
}
