//! # mapping-types
//!
//! Core data model shared by every stage of the mapping engine.
//!
//! A [`MappingTree`] holds one release's classes, fields and methods, each
//! carrying at most one name per [`Namespace`]. Descriptors are always
//! expressed in the structural `source` namespace and can be rewritten into
//! any other namespace through the tree's own class names.
//!
//! Provider adapters produce [`Fragment`]s, which the composer merges into a
//! tree. [`Release`] values come from a [`VersionManifest`] and carry the
//! total order used by ancestry computation.

pub mod descriptor;
pub mod diagnostic;
pub mod error;
pub mod fragment;
pub mod namespace;
pub mod release;
pub mod tree;

pub use diagnostic::{Diagnostic, EntityPath, Severity};
pub use error::{TypesError, TypesResult};
pub use fragment::{Fragment, FragmentClass, FragmentField, FragmentMethod, FragmentParam};
pub use namespace::Namespace;
pub use release::{Release, ReleaseFilter, ReleaseKind, VersionManifest};
pub use tree::{
    access, ClassEntity, FieldEntity, FieldKey, MappingTree, MethodEntity, MethodKey, NameMap,
    Named, ParamEntity,
};
