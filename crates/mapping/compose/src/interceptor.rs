use mapping_types::MappingTree;
use tracing::debug;

/// A pure tree-to-tree transform applied after composition.
///
/// Implementations must be idempotent: applying one to its own output yields
/// the same tree.
pub trait Interceptor: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    fn intercept(&self, tree: MappingTree) -> MappingTree;
}

/// Ordered list of interceptors.
#[derive(Default)]
pub struct InterceptorChain {
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn builder() -> InterceptorChainBuilder {
        InterceptorChainBuilder::default()
    }

    /// Apply every interceptor in configured order.
    pub fn apply(&self, tree: MappingTree) -> MappingTree {
        self.interceptors.iter().fold(tree, |tree, interceptor| {
            debug!(
                release = %tree.release(),
                interceptor = interceptor.name(),
                "Applying interceptor"
            );
            interceptor.intercept(tree)
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.names())
            .finish()
    }
}

/// Builder for [`InterceptorChain`]; order of `then` calls is application order.
#[derive(Default)]
pub struct InterceptorChainBuilder {
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl InterceptorChainBuilder {
    pub fn then(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    pub fn then_boxed(mut self, interceptor: Box<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn build(self) -> InterceptorChain {
        InterceptorChain {
            interceptors: self.interceptors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{NamespaceFilter, StaticInitializerFilter};
    use chrono::Utc;
    use mapping_types::{MethodKey, Named, Namespace, Release, ReleaseKind};

    struct Rename(&'static str);

    impl Interceptor for Rename {
        fn name(&self) -> &str {
            "rename"
        }

        fn intercept(&self, mut tree: MappingTree) -> MappingTree {
            if let Some(class) = tree.class_mut("a") {
                class.set_name(Namespace::new("yarn"), self.0);
            }
            tree
        }
    }

    fn tree() -> MappingTree {
        let mut tree = MappingTree::new(Release::new("1.0", ReleaseKind::Release, Utc::now()));
        tree.register_namespace(&Namespace::new("yarn"));
        tree.register_namespace(&Namespace::new("searge_id"));
        let a = tree.class_or_insert("a");
        a.set_name(Namespace::new("searge_id"), "1234");
        a.method_or_insert(MethodKey::new("<clinit>", "()V"));
        tree
    }

    #[test]
    fn applies_in_builder_order() {
        let chain = InterceptorChain::builder()
            .then(Rename("First"))
            .then(Rename("Second"))
            .build();
        let tree = chain.apply(tree());
        assert_eq!(tree.class_name("a", "yarn"), Some("Second"));
    }

    #[test]
    fn chain_of_filters() {
        let chain = InterceptorChain::builder()
            .then(NamespaceFilter::new("searge_id"))
            .then(StaticInitializerFilter)
            .build();
        assert_eq!(chain.names(), vec!["namespace-filter", "static-initializer-filter"]);

        let tree = chain.apply(tree());
        assert!(!tree.has_namespace("searge_id"));
        assert!(tree.class("a").unwrap().methods.is_empty());
    }
}
