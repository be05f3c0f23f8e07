use mapping_types::Namespace;
use serde::{Deserialize, Serialize};

/// Namespace sets driving the analyzer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Namespaces a nested class may borrow its simple name from, in priority order.
    #[serde(default)]
    pub inner_class_name_completion_candidates: Vec<Namespace>,

    /// Namespaces whose missing inner-class names get completed.
    /// `None` completes every namespace of the tree.
    #[serde(default)]
    pub inner_class_name_completion_targets: Option<Vec<Namespace>>,

    /// Namespaces in which method names are propagated down override chains.
    #[serde(default)]
    pub inheritance_additional_namespaces: Vec<Namespace>,
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completion_candidates<I, N>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Namespace>,
    {
        self.inner_class_name_completion_candidates = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn completion_targets<I, N>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Namespace>,
    {
        self.inner_class_name_completion_targets =
            Some(namespaces.into_iter().map(Into::into).collect());
        self
    }

    pub fn inheritance_namespaces<I, N>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Namespace>,
    {
        self.inheritance_additional_namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn is_completion_target(&self, namespace: &Namespace) -> bool {
        self.inner_class_name_completion_targets
            .as_ref()
            .map_or(true, |targets| targets.contains(namespace))
    }
}
