use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use mapping_types::{Fragment, Namespace, Release};
use serde::{Deserialize, Serialize};

/// Identifier of one contributor in a release's contributor list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContributorId(String);

impl ContributorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContributorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContributorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Rewrites a contributor's fragment before it is merged.
pub trait FragmentTransform: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn transform(&self, release: &Release, fragment: Fragment) -> Fragment;
}

/// One step of composition.
#[derive(Clone, Debug)]
pub enum Contribution {
    /// Merge a provider fragment as-is.
    Add {
        id: ContributorId,
        fragment: Arc<Fragment>,
    },
    /// Take the output of an earlier contributor, transform it and merge the
    /// result here instead of at the inner contributor's position.
    Wrap {
        id: ContributorId,
        inner: ContributorId,
        transform: Arc<dyn FragmentTransform>,
    },
}

impl Contribution {
    pub fn add(id: impl Into<ContributorId>, fragment: impl Into<Arc<Fragment>>) -> Self {
        Self::Add {
            id: id.into(),
            fragment: fragment.into(),
        }
    }

    pub fn wrap(
        id: impl Into<ContributorId>,
        inner: impl Into<ContributorId>,
        transform: Arc<dyn FragmentTransform>,
    ) -> Self {
        Self::Wrap {
            id: id.into(),
            inner: inner.into(),
            transform,
        }
    }

    pub fn id(&self) -> &ContributorId {
        match self {
            Self::Add { id, .. } | Self::Wrap { id, .. } => id,
        }
    }
}

/// Prefixes package-less class names of one namespace.
///
/// Legacy releases of some providers publish classes without their package;
/// for the releases listed in `prepend_everything_in` every class name is
/// prefixed, packaged or not.
#[derive(Clone, Debug)]
pub struct PackagePrefixer {
    namespace: Namespace,
    prefix: String,
    prepend_everything_in: HashSet<String>,
}

impl PackagePrefixer {
    pub fn new(namespace: impl Into<Namespace>, prefix: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            prefix: prefix.into(),
            prepend_everything_in: HashSet::new(),
        }
    }

    pub fn prepend_everything_in<I, S>(mut self, releases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prepend_everything_in
            .extend(releases.into_iter().map(Into::into));
        self
    }
}

impl FragmentTransform for PackagePrefixer {
    fn name(&self) -> &str {
        "package-prefixer"
    }

    fn transform(&self, release: &Release, mut fragment: Fragment) -> Fragment {
        if fragment.namespace != self.namespace {
            return fragment;
        }

        let everything = self.prepend_everything_in.contains(&release.id);
        for class in &mut fragment.classes {
            if let Some(name) = class.name.as_mut() {
                if everything || !name.contains('/') {
                    name.insert_str(0, &self.prefix);
                }
            }
        }
        fragment
    }
}

/// Replaces a leading package path in one namespace's class names.
#[derive(Clone, Debug)]
pub struct NameReplacer {
    namespace: Namespace,
    from: String,
    to: String,
}

impl NameReplacer {
    pub fn new(
        namespace: impl Into<Namespace>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

impl FragmentTransform for NameReplacer {
    fn name(&self) -> &str {
        "name-replacer"
    }

    fn transform(&self, _release: &Release, mut fragment: Fragment) -> Fragment {
        if fragment.namespace != self.namespace {
            return fragment;
        }

        for class in &mut fragment.classes {
            if let Some(name) = class.name.as_mut() {
                if let Some(rest) = name.strip_prefix(self.from.as_str()) {
                    *name = format!("{}{}", self.to, rest);
                }
            }
        }
        fragment
    }
}
