//! # mapping-ancestry
//!
//! Tracks the identity of classes, fields and methods across an ordered
//! sequence of release trees.
//!
//! ## Lineage
//!
//! An [`AncestryNode`] collects the `(release, entity)` pairs judged to be the
//! same entity. Releases are scanned in order; an entity of release *i* joins
//! an open node from release *i-1* when both agree on the configured identity
//! namespaces. Nodes that find no entity in a release are sealed.
//!
//! Class lineage runs first. Every sealed class node immediately schedules
//! independent field and method scans scoped to that node's classes.
//!
//! ## Indices
//!
//! [`IndexAssigner`] numbers sealed nodes of each kind in a deterministic
//! order and produces a [`LineageIndex`] which can write the numbers into a
//! synthetic namespace of every tree.

pub mod error;
pub mod index;
pub mod matcher;
pub mod node;
pub mod options;
pub mod resolver;
pub mod signature;

pub use error::{AncestryError, AncestryResult};
pub use index::{IndexAssigner, LineageIndex, LineageRecord, LineageSummary, Occurrence};
pub use node::{AncestryNode, AncestrySet, ClassNode, EntityKind, FieldNode, MethodNode};
pub use options::{AncestryOptions, ConstructorMode};
pub use resolver::AncestryResolver;
