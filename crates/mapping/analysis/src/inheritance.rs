use std::collections::{HashMap, HashSet};

use mapping_types::MappingTree;

/// Supertype edges of one release, reconstructed from the structural namespace.
///
/// Only edges whose endpoints are both in the tree are kept; platform types
/// outside the tree (the root type, runtime library) carry no names to borrow.
#[derive(Clone, Debug, Default)]
pub struct InheritanceGraph {
    parents: HashMap<String, Vec<String>>,
    children: HashMap<String, Vec<String>>,
}

impl InheritanceGraph {
    pub fn build(tree: &MappingTree) -> Self {
        let mut graph = Self::default();
        for class in tree.classes() {
            for supertype in class.supertypes() {
                if supertype == class.source || tree.class(supertype).is_none() {
                    continue;
                }
                graph
                    .parents
                    .entry(class.source.clone())
                    .or_default()
                    .push(supertype.to_string());
                graph
                    .children
                    .entry(supertype.to_string())
                    .or_default()
                    .push(class.source.clone());
            }
        }
        graph
    }

    /// Direct supertypes, superclass first.
    pub fn parents(&self, class: &str) -> &[String] {
        self.parents.get(class).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn children(&self, class: &str) -> &[String] {
        self.children.get(class).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.parents.values().map(Vec::len).sum()
    }

    /// Ancestors grouped by distance, nearest first.
    ///
    /// Each ancestor appears once, at its shortest distance; within a level,
    /// order follows declaration order (superclass before interfaces).
    pub fn ancestor_levels(&self, class: &str) -> Vec<Vec<&str>> {
        let mut levels = Vec::new();
        let mut visited: HashSet<&str> = HashSet::from([class]);
        let mut frontier: Vec<&str> = vec![class];

        loop {
            let mut next = Vec::new();
            for current in &frontier {
                for parent in self.parents(current) {
                    if visited.insert(parent.as_str()) {
                        next.push(parent.as_str());
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            levels.push(next.clone());
            frontier = next;
        }
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mapping_types::{Release, ReleaseKind};

    /// d extends b implements c; b extends a; c extends a.
    fn diamond() -> MappingTree {
        let mut tree = MappingTree::new(Release::new("1.0", ReleaseKind::Release, Utc::now()));
        tree.class_or_insert("a").super_class = Some("java/lang/Object".into());
        tree.class_or_insert("b").super_class = Some("a".into());
        tree.class_or_insert("c").interfaces = vec!["a".into()];
        let d = tree.class_or_insert("d");
        d.super_class = Some("b".into());
        d.interfaces = vec!["c".into()];
        tree
    }

    #[test]
    fn levels_are_deduplicated_and_ordered() {
        let graph = InheritanceGraph::build(&diamond());
        assert_eq!(graph.ancestor_levels("d"), vec![vec!["b", "c"], vec!["a"]]);
        assert!(graph.ancestor_levels("a").is_empty());
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.children("a"), &["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn cycles_terminate() {
        let mut tree = diamond();
        tree.class_or_insert("a").super_class = Some("d".into());
        let graph = InheritanceGraph::build(&tree);
        let levels = graph.ancestor_levels("d");
        let flat: Vec<_> = levels.into_iter().flatten().collect();
        assert_eq!(flat, vec!["b", "c", "a"]);
    }
}
