use mapping_types::{MappingTree, Namespace};
use tracing::debug;

use crate::interceptor::Interceptor;

/// Drops every name of one namespace.
#[derive(Clone, Debug)]
pub struct NamespaceFilter {
    namespace: Namespace,
}

impl NamespaceFilter {
    pub fn new(namespace: impl Into<Namespace>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl Interceptor for NamespaceFilter {
    fn name(&self) -> &str {
        "namespace-filter"
    }

    fn intercept(&self, mut tree: MappingTree) -> MappingTree {
        if tree.remove_namespace(self.namespace.as_str()) {
            debug!(release = %tree.release(), namespace = %self.namespace, "Removed namespace");
        }
        tree
    }
}
