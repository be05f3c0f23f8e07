use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TypesError, TypesResult};

/// Release channel of a platform version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseKind {
    Release,
    Snapshot,
    OldBeta,
    OldAlpha,
}

/// One platform version.
///
/// Releases are totally ordered by release time, then by id, which is the
/// order every ancestry scan walks them in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Release {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ReleaseKind,
    #[serde(rename = "releaseTime")]
    pub released_at: DateTime<Utc>,
}

impl Release {
    pub fn new(id: impl Into<String>, kind: ReleaseKind, released_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind,
            released_at,
        }
    }
}

impl Ord for Release {
    fn cmp(&self, other: &Self) -> Ordering {
        self.released_at
            .cmp(&other.released_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Release {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Upstream version manifest.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<Release>,
}

impl VersionManifest {
    pub fn new(versions: Vec<Release>) -> Self {
        Self { versions }
    }

    pub fn from_json(json: &str) -> TypesResult<Self> {
        serde_json::from_str(json).map_err(|e| TypesError::Manifest(e.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&Release> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Select every version between `oldest` and `newest`, both inclusive.
    pub fn range(&self, oldest: &str, newest: &str) -> TypesResult<ReleaseFilter> {
        let low = self
            .get(oldest)
            .ok_or_else(|| TypesError::UnknownRelease(oldest.to_string()))?;
        let high = self
            .get(newest)
            .ok_or_else(|| TypesError::UnknownRelease(newest.to_string()))?;
        if low > high {
            return Err(TypesError::InvertedRange {
                oldest: oldest.to_string(),
                newest: newest.to_string(),
            });
        }

        let candidates = self
            .versions
            .iter()
            .filter(|v| *v >= low && *v <= high)
            .cloned()
            .collect();
        Ok(ReleaseFilter {
            candidates,
            excluded: HashSet::new(),
            kinds: None,
        })
    }
}

/// Inclusion/exclusion filter over a manifest range.
#[derive(Clone, Debug)]
pub struct ReleaseFilter {
    candidates: Vec<Release>,
    excluded: HashSet<String>,
    kinds: Option<HashSet<ReleaseKind>>,
}

impl ReleaseFilter {
    pub fn exclude<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn include_kinds<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = ReleaseKind>,
    {
        self.kinds
            .get_or_insert_with(HashSet::new)
            .extend(kinds);
        self
    }

    /// The selected releases in ascending order.
    pub fn resolve(self) -> Vec<Release> {
        let mut selected: Vec<Release> = self
            .candidates
            .into_iter()
            .filter(|r| !self.excluded.contains(&r.id))
            .filter(|r| self.kinds.as_ref().map_or(true, |k| k.contains(&r.kind)))
            .collect();
        selected.sort();
        selected
    }
}
