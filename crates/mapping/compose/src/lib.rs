//! # mapping-compose
//!
//! Builds one release's merged tree and cleans it up.
//!
//! 1. **Composition**: [`compose`] applies an ordered list of
//!    [`Contribution`]s to a fresh tree. `Add` merges a provider fragment;
//!    `Wrap` transforms an earlier contributor's fragment before it is merged.
//!    When two contributors name the same entity in the same namespace, the
//!    later one wins.
//! 2. **Interception**: an [`InterceptorChain`] applies pure tree-to-tree
//!    transforms in configured order. Every shipped interceptor is idempotent.

pub mod composer;
pub mod contributor;
pub mod error;
pub mod filters;
pub mod interceptor;

pub use composer::compose;
pub use contributor::{Contribution, ContributorId, FragmentTransform, NameReplacer, PackagePrefixer};
pub use error::{ComposeError, ComposeResult};
pub use filters::{
    NamespaceFilter, ObjectOverrideFilter, ParameterNameFilter, StaticInitializerFilter,
};
pub use interceptor::{Interceptor, InterceptorChain, InterceptorChainBuilder};
