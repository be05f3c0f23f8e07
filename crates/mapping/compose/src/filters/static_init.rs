use mapping_types::MappingTree;

use crate::interceptor::Interceptor;

/// Drops class initialization blocks (`<clinit>`); no provider names them.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticInitializerFilter;

impl Interceptor for StaticInitializerFilter {
    fn name(&self) -> &str {
        "static-initializer-filter"
    }

    fn intercept(&self, mut tree: MappingTree) -> MappingTree {
        for class in tree.classes_mut() {
            class.methods.retain(|_, m| !m.is_static_initializer());
        }
        tree
    }
}
