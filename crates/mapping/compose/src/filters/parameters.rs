use mapping_types::{MappingTree, Named, Namespace};

use crate::interceptor::Interceptor;

/// Drops parameter names of one namespace, keeping its class and member names.
///
/// Used for providers whose parameter names are generated filler.
#[derive(Clone, Debug)]
pub struct ParameterNameFilter {
    namespace: Namespace,
}

impl ParameterNameFilter {
    pub fn new(namespace: impl Into<Namespace>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl Interceptor for ParameterNameFilter {
    fn name(&self) -> &str {
        "parameter-name-filter"
    }

    fn intercept(&self, mut tree: MappingTree) -> MappingTree {
        let namespace = self.namespace.as_str();
        for class in tree.classes_mut() {
            for method in class.methods.values_mut() {
                for param in method.params.values_mut() {
                    param.remove_name(namespace);
                }
                method.params.retain(|_, p| !p.names.is_empty());
            }
        }
        tree
    }
}
