use mapping_types::{MethodEntity, Namespace};
use serde::{Deserialize, Serialize};

/// How constructors take part in method lineage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorMode {
    /// Constructors get no lineage.
    #[default]
    Exclude,
    /// Constructors are matched like any other method.
    Include,
    /// Only constructors get lineage.
    Only,
}

impl ConstructorMode {
    /// Whether `method` takes part in method lineage. Static initializers never do.
    pub fn admits(self, method: &MethodEntity) -> bool {
        if method.is_static_initializer() {
            return false;
        }
        match self {
            Self::Exclude => !method.is_constructor(),
            Self::Include => true,
            Self::Only => method.is_constructor(),
        }
    }
}

/// Identity signals used to link entities across releases.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AncestryOptions {
    /// Namespaces considered reliable identity signals, in resolution order.
    pub namespaces: Vec<Namespace>,

    /// Namespaces where a name present on only one side is a mismatch.
    pub mandatory: Vec<Namespace>,

    /// Minimum number of present-and-equal names for a match.
    pub min_matching_namespaces: usize,

    pub constructor_mode: ConstructorMode,
}

impl Default for AncestryOptions {
    fn default() -> Self {
        Self {
            namespaces: Vec::new(),
            mandatory: Vec::new(),
            min_matching_namespaces: 1,
            constructor_mode: ConstructorMode::default(),
        }
    }
}

impl AncestryOptions {
    pub fn new<I, N>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Namespace>,
    {
        Self {
            namespaces: namespaces.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn mandatory<I, N>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Namespace>,
    {
        self.mandatory = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn min_matching(mut self, count: usize) -> Self {
        self.min_matching_namespaces = count;
        self
    }

    pub fn constructors(mut self, mode: ConstructorMode) -> Self {
        self.constructor_mode = mode;
        self
    }

    pub fn is_mandatory(&self, namespace: &Namespace) -> bool {
        self.mandatory.contains(namespace)
    }
}
