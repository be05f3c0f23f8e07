use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named coordinate system for identifiers.
///
/// One namespace exists per data provider, plus the structural `source`
/// namespace holding obfuscated names and descriptors. Names starting with
/// `meta_` are reserved for structural columns in the interchange format.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Name of the structural namespace.
    pub const SOURCE: &'static str = "source";

    /// Prefix reserved for structural metadata columns.
    pub const META_PREFIX: &'static str = "meta_";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn source() -> Self {
        Self(Self::SOURCE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_source(&self) -> bool {
        self.0 == Self::SOURCE
    }

    pub fn is_meta(&self) -> bool {
        self.0.starts_with(Self::META_PREFIX)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Namespace {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Namespace {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Namespace {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn source_and_meta_detection() {
        assert!(Namespace::source().is_source());
        assert!(!Namespace::new("mojang").is_source());
        assert!(Namespace::new("meta_super").is_meta());
        assert!(!Namespace::new("metadata").is_meta());
    }

    #[test]
    fn map_lookup_by_str() {
        let mut map = BTreeMap::new();
        map.insert(Namespace::new("yarn"), "Foo".to_string());
        assert_eq!(map.get("yarn").map(String::as_str), Some("Foo"));
    }
}
