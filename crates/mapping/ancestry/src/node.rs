use std::collections::BTreeMap;
use std::fmt;

use mapping_types::{FieldKey, MethodKey};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Class,
    Field,
    Method,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::Field => write!(f, "field"),
            Self::Method => write!(f, "method"),
        }
    }
}

/// One entity followed across releases.
///
/// Entries are `(release ordinal, key)` pairs with strictly increasing,
/// consecutive ordinals: a node never skips a release and never holds two
/// entities of the same release.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AncestryNode<K> {
    seq: usize,
    entries: Vec<(usize, K)>,
}

/// Class lineage; keys are structural class names.
pub type ClassNode = AncestryNode<String>;
pub type FieldNode = AncestryNode<FieldKey>;
pub type MethodNode = AncestryNode<MethodKey>;

impl<K> AncestryNode<K> {
    pub(crate) fn open(seq: usize, ordinal: usize, key: K) -> Self {
        Self {
            seq,
            entries: vec![(ordinal, key)],
        }
    }

    pub(crate) fn extend(&mut self, ordinal: usize, key: K) {
        self.entries.push((ordinal, key));
    }

    /// Creation order within the scan that produced this node.
    pub fn seq(&self) -> usize {
        self.seq
    }

    pub fn entries(&self) -> &[(usize, K)] {
        &self.entries
    }

    pub fn first(&self) -> Option<&(usize, K)> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&(usize, K)> {
        self.entries.last()
    }

    /// Ordinal of the release this lineage starts in.
    pub fn first_release(&self) -> usize {
        self.entries.first().map_or(0, |(ordinal, _)| *ordinal)
    }

    pub fn releases(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(ordinal, _)| *ordinal)
    }

    pub fn key_at(&self, ordinal: usize) -> Option<&K> {
        self.entries
            .binary_search_by_key(&ordinal, |(o, _)| *o)
            .ok()
            .map(|i| &self.entries[i].1)
    }

    pub fn contains_release(&self, ordinal: usize) -> bool {
        self.key_at(ordinal).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sealed lineage of every entity kind for one release sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AncestrySet {
    pub(crate) releases: Vec<String>,
    pub(crate) classes: Vec<ClassNode>,
    pub(crate) fields: BTreeMap<usize, Vec<FieldNode>>,
    pub(crate) methods: BTreeMap<usize, Vec<MethodNode>>,
}

impl AncestrySet {
    /// Release ids by ordinal.
    pub fn releases(&self) -> &[String] {
        &self.releases
    }

    /// Class lineages in creation order.
    pub fn classes(&self) -> &[ClassNode] {
        &self.classes
    }

    pub fn class(&self, seq: usize) -> Option<&ClassNode> {
        self.classes
            .binary_search_by_key(&seq, ClassNode::seq)
            .ok()
            .map(|i| &self.classes[i])
    }

    /// Field lineages of the class lineage `class_seq`.
    pub fn fields_of(&self, class_seq: usize) -> &[FieldNode] {
        self.fields.get(&class_seq).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn methods_of(&self, class_seq: usize) -> &[MethodNode] {
        self.methods.get(&class_seq).map(Vec::as_slice).unwrap_or_default()
    }

    /// Class lineage holding `source` in release `ordinal`.
    pub fn class_at(&self, ordinal: usize, source: &str) -> Option<&ClassNode> {
        self.classes
            .iter()
            .find(|node| node.key_at(ordinal).is_some_and(|key| key == source))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn field_count(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn method_count(&self) -> usize {
        self.methods.values().map(Vec::len).sum()
    }
}
