use mapping_types::{MappingTree, MethodEntity, MethodKey};

use crate::interceptor::Interceptor;

/// Methods declared on the universal root type.
const ROOT_METHODS: &[(&str, &str)] = &[
    ("equals", "(Ljava/lang/Object;)Z"),
    ("hashCode", "()I"),
    ("toString", "()Ljava/lang/String;"),
    ("clone", "()Ljava/lang/Object;"),
    ("finalize", "()V"),
];

/// Drops implicit overrides of root-type methods.
///
/// A method is dropped only when its signature matches a root method and no
/// namespace gives it a name other than the default one.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectOverrideFilter;

impl ObjectOverrideFilter {
    fn is_implicit(key: &MethodKey, method: &MethodEntity) -> bool {
        ROOT_METHODS
            .iter()
            .any(|(name, desc)| key.name == *name && key.descriptor == *desc)
            && method.names.values().all(|n| *n == key.name)
    }
}

impl Interceptor for ObjectOverrideFilter {
    fn name(&self) -> &str {
        "object-override-filter"
    }

    fn intercept(&self, mut tree: MappingTree) -> MappingTree {
        for class in tree.classes_mut() {
            class.methods.retain(|key, m| !Self::is_implicit(key, m));
        }
        tree
    }
}
