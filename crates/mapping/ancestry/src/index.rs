//! Stable integer identities for sealed lineage nodes.

use std::collections::HashMap;
use std::sync::Arc;

use mapping_types::{EntityPath, FieldKey, MappingTree, MethodKey, Named, Namespace};
use serde::Serialize;
use tracing::info;

use crate::error::{AncestryError, AncestryResult};
use crate::node::{AncestryNode, AncestrySet, ClassNode, EntityKind};
use crate::options::AncestryOptions;

/// One appearance of a lineage in a release.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub release: String,
    pub path: EntityPath,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LineageRecord {
    pub index: usize,
    /// Index of the owning class lineage, for fields and methods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<usize>,
    pub history: Vec<Occurrence>,
}

/// Serializable view of a [`LineageIndex`].
#[derive(Debug, Serialize)]
pub struct LineageSummary<'a> {
    pub releases: &'a [String],
    pub classes: &'a [LineageRecord],
    pub fields: &'a [LineageRecord],
    pub methods: &'a [LineageRecord],
}

/// Complete index assignment for one ancestry run.
///
/// Only [`IndexAssigner::assign`] builds one, so every value handed out is
/// fully assigned.
#[derive(Clone, Debug, Default)]
pub struct LineageIndex {
    releases: Vec<String>,
    classes: Vec<LineageRecord>,
    fields: Vec<LineageRecord>,
    methods: Vec<LineageRecord>,
    class_at: Vec<HashMap<String, usize>>,
    field_at: Vec<HashMap<(String, FieldKey), usize>>,
    method_at: Vec<HashMap<(String, MethodKey), usize>>,
}

impl LineageIndex {
    pub fn releases(&self) -> &[String] {
        &self.releases
    }

    pub fn records(&self, kind: EntityKind) -> &[LineageRecord] {
        match kind {
            EntityKind::Class => &self.classes,
            EntityKind::Field => &self.fields,
            EntityKind::Method => &self.methods,
        }
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.records(kind).len()
    }

    /// Every appearance of lineage `index`, oldest first.
    pub fn history(&self, kind: EntityKind, index: usize) -> Option<&[Occurrence]> {
        self.records(kind)
            .get(index)
            .map(|record| record.history.as_slice())
    }

    pub fn class_index(&self, ordinal: usize, class: &str) -> Option<usize> {
        self.class_at.get(ordinal)?.get(class).copied()
    }

    pub fn field_index(&self, ordinal: usize, class: &str, field: &FieldKey) -> Option<usize> {
        self.field_at
            .get(ordinal)?
            .get(&(class.to_string(), field.clone()))
            .copied()
    }

    pub fn method_index(&self, ordinal: usize, class: &str, method: &MethodKey) -> Option<usize> {
        self.method_at
            .get(ordinal)?
            .get(&(class.to_string(), method.clone()))
            .copied()
    }

    /// Write every index as a decimal name in `namespace`.
    ///
    /// `trees` must be the release sequence the index was computed from.
    /// Returns the number of entities stamped.
    pub fn apply(&self, namespace: &Namespace, trees: &mut [MappingTree]) -> AncestryResult<usize> {
        if namespace.is_source() || namespace.is_meta() {
            return Err(AncestryError::ReservedNamespace(namespace.clone()));
        }
        let found: Vec<String> = trees.iter().map(|t| t.release().id.clone()).collect();
        if found != self.releases {
            return Err(AncestryError::SequenceMismatch {
                expected: self.releases.clone(),
                found,
            });
        }

        let mut stamped = 0;
        for (ordinal, tree) in trees.iter_mut().enumerate() {
            tree.register_namespace(namespace);
            for (class, index) in &self.class_at[ordinal] {
                if let Some(entity) = tree.class_mut(class) {
                    entity.set_name(namespace.clone(), index.to_string());
                    stamped += 1;
                }
            }
            for ((class, key), index) in &self.field_at[ordinal] {
                if let Some(entity) = tree.class_mut(class).and_then(|c| c.fields.get_mut(key)) {
                    entity.set_name(namespace.clone(), index.to_string());
                    stamped += 1;
                }
            }
            for ((class, key), index) in &self.method_at[ordinal] {
                if let Some(entity) = tree.class_mut(class).and_then(|c| c.methods.get_mut(key)) {
                    entity.set_name(namespace.clone(), index.to_string());
                    stamped += 1;
                }
            }
        }
        info!(namespace = %namespace, stamped, "Applied lineage indices");
        Ok(stamped)
    }

    pub fn summary(&self) -> LineageSummary<'_> {
        LineageSummary {
            releases: &self.releases,
            classes: &self.classes,
            fields: &self.fields,
            methods: &self.methods,
        }
    }
}

/// Numbers sealed lineage nodes.
///
/// Classes are ordered by first release, then by resolved name: the name in
/// the first identity namespace that has one, falling back to the structural
/// name. Fields and methods are ordered by first release, owning class index,
/// then resolved name and descriptor.
#[derive(Clone, Debug, Default)]
pub struct IndexAssigner {
    namespaces: Vec<Namespace>,
}

impl IndexAssigner {
    pub fn new(options: &AncestryOptions) -> Self {
        Self {
            namespaces: options.namespaces.clone(),
        }
    }

    pub fn assign(
        &self,
        set: &AncestrySet,
        trees: &[Arc<MappingTree>],
    ) -> AncestryResult<LineageIndex> {
        let found: Vec<String> = trees.iter().map(|t| t.release().id.clone()).collect();
        if found != set.releases {
            return Err(AncestryError::SequenceMismatch {
                expected: set.releases.clone(),
                found,
            });
        }

        let release_count = set.releases.len();
        let mut index = LineageIndex {
            releases: set.releases.clone(),
            class_at: vec![HashMap::new(); release_count],
            field_at: vec![HashMap::new(); release_count],
            method_at: vec![HashMap::new(); release_count],
            ..LineageIndex::default()
        };

        let mut classes: Vec<(usize, &str, usize, &ClassNode)> = set
            .classes
            .iter()
            .map(|node| {
                let name = node
                    .first()
                    .map(|(ordinal, source)| {
                        self.resolve(trees[*ordinal].class(source), source)
                    })
                    .unwrap_or_default();
                (node.first_release(), name, node.seq(), node)
            })
            .collect();
        classes.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

        let mut class_index_by_seq = HashMap::new();
        for (position, (_, _, seq, node)) in classes.iter().enumerate() {
            class_index_by_seq.insert(*seq, position);
            let mut history = Vec::with_capacity(node.len());
            for (ordinal, source) in node.entries() {
                index.class_at[*ordinal].insert(source.clone(), position);
                history.push(Occurrence {
                    release: set.releases[*ordinal].clone(),
                    path: EntityPath::class(source),
                });
            }
            index.classes.push(LineageRecord {
                index: position,
                owner: None,
                history,
            });
        }

        // Fields.
        let mut fields = Vec::new();
        for (class_seq, nodes) in &set.fields {
            let (Some(&owner), Some(class)) = (class_index_by_seq.get(class_seq), set.class(*class_seq))
            else {
                continue;
            };
            for node in nodes {
                let Some((ordinal, key)) = node.first() else {
                    continue;
                };
                let entity = class
                    .key_at(*ordinal)
                    .and_then(|source| trees[*ordinal].class(source))
                    .and_then(|c| c.field(key));
                let name = self.resolve(entity, &key.name);
                let descriptor = key.descriptor.as_deref().unwrap_or_default();
                fields.push(((node.first_release(), owner, name, descriptor, node.seq()), class, node));
            }
        }
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        for (position, ((_, owner, ..), class, node)) in fields.into_iter().enumerate() {
            let history = member_history(set, class, node, |class, key| EntityPath::Field {
                class: class.to_string(),
                name: key.name.clone(),
                descriptor: key.descriptor.clone(),
            });
            for (ordinal, key) in node.entries() {
                if let Some(source) = class.key_at(*ordinal) {
                    index.field_at[*ordinal].insert((source.clone(), key.clone()), position);
                }
            }
            index.fields.push(LineageRecord {
                index: position,
                owner: Some(owner),
                history,
            });
        }

        // Methods.
        let mut methods = Vec::new();
        for (class_seq, nodes) in &set.methods {
            let (Some(&owner), Some(class)) = (class_index_by_seq.get(class_seq), set.class(*class_seq))
            else {
                continue;
            };
            for node in nodes {
                let Some((ordinal, key)) = node.first() else {
                    continue;
                };
                let entity = class
                    .key_at(*ordinal)
                    .and_then(|source| trees[*ordinal].class(source))
                    .and_then(|c| c.method(key));
                let name = self.resolve(entity, &key.name);
                methods.push((
                    (node.first_release(), owner, name, key.descriptor.as_str(), node.seq()),
                    class,
                    node,
                ));
            }
        }
        methods.sort_by(|a, b| a.0.cmp(&b.0));
        for (position, ((_, owner, ..), class, node)) in methods.into_iter().enumerate() {
            let history = member_history(set, class, node, |class, key| EntityPath::Method {
                class: class.to_string(),
                name: key.name.clone(),
                descriptor: key.descriptor.clone(),
            });
            for (ordinal, key) in node.entries() {
                if let Some(source) = class.key_at(*ordinal) {
                    index.method_at[*ordinal].insert((source.clone(), key.clone()), position);
                }
            }
            index.methods.push(LineageRecord {
                index: position,
                owner: Some(owner),
                history,
            });
        }

        info!(
            classes = index.classes.len(),
            fields = index.fields.len(),
            methods = index.methods.len(),
            "Assigned lineage indices"
        );
        Ok(index)
    }

    fn resolve<'t, N: Named>(&self, entity: Option<&'t N>, fallback: &'t str) -> &'t str {
        entity
            .and_then(|e| self.namespaces.iter().find_map(|ns| e.name(ns.as_str())))
            .unwrap_or(fallback)
    }
}

fn member_history<K>(
    set: &AncestrySet,
    class: &ClassNode,
    node: &AncestryNode<K>,
    path: impl Fn(&str, &K) -> EntityPath,
) -> Vec<Occurrence> {
    node.entries()
        .iter()
        .filter_map(|(ordinal, key)| {
            let source = class.key_at(*ordinal)?;
            Some(Occurrence {
                release: set.releases.get(*ordinal)?.clone(),
                path: path(source, key),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::AncestryResolver;
    use chrono::{Duration, TimeZone, Utc};
    use mapping_types::{Release, ReleaseKind};

    fn tree(ordinal: i64, classes: &[(&str, &str)]) -> MappingTree {
        let at = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap() + Duration::days(ordinal);
        let mut tree = MappingTree::new(Release::new(format!("r{ordinal}"), ReleaseKind::Release, at));
        let mojang = Namespace::new("mojang");
        tree.register_namespace(&mojang);
        for (source, name) in classes {
            let class = tree.class_or_insert(source);
            class.set_name(mojang.clone(), *name);
            class
                .field_or_insert(FieldKey::new("f", Some("I".into())))
                .set_name(mojang.clone(), "value");
            class
                .method_or_insert(MethodKey::new("m", "()V"))
                .set_name(mojang.clone(), "run");
        }
        tree
    }

    async fn index_for(trees: Vec<MappingTree>) -> (LineageIndex, Vec<MappingTree>) {
        let options = AncestryOptions::new(["mojang"]);
        let shared: Arc<[Arc<MappingTree>]> = trees.iter().cloned().map(Arc::new).collect();
        let set = AncestryResolver::new(options.clone())
            .resolve(Arc::clone(&shared))
            .await
            .unwrap();
        let index = IndexAssigner::new(&options).assign(&set, &shared).unwrap();
        (index, trees)
    }

    #[tokio::test]
    async fn classes_ordered_by_first_release_then_name() {
        let (index, _) = index_for(vec![
            tree(0, &[("a", "net/Beta"), ("b", "net/Alpha")]),
            tree(1, &[("x", "net/Alpha"), ("y", "net/Beta"), ("z", "net/Aardvark")]),
        ])
        .await;

        assert_eq!(index.class_index(0, "b"), Some(0));
        assert_eq!(index.class_index(0, "a"), Some(1));
        assert_eq!(index.class_index(1, "x"), Some(0));
        assert_eq!(index.class_index(1, "y"), Some(1));
        // New in the second release, so it sorts after older lineages.
        assert_eq!(index.class_index(1, "z"), Some(2));

        assert_eq!(index.len(EntityKind::Field), 3);
        assert_eq!(
            index.field_index(1, "z", &FieldKey::new("f", Some("I".into()))),
            Some(2)
        );
        assert_eq!(index.records(EntityKind::Method)[2].owner, Some(2));
    }

    #[tokio::test]
    async fn history_follows_renames() {
        let (index, _) = index_for(vec![
            tree(0, &[("a", "net/Alpha")]),
            tree(1, &[("q", "net/Alpha")]),
        ])
        .await;

        let history = index.history(EntityKind::Class, 0).unwrap();
        assert_eq!(
            history,
            &[
                Occurrence {
                    release: "r0".into(),
                    path: EntityPath::class("a"),
                },
                Occurrence {
                    release: "r1".into(),
                    path: EntityPath::class("q"),
                },
            ]
        );
        let method = index.history(EntityKind::Method, 0).unwrap();
        assert_eq!(method[1].path.owner(), "q");
        assert!(index.history(EntityKind::Class, 1).is_none());
    }

    #[tokio::test]
    async fn indices_are_written_into_a_synthetic_namespace() {
        let (index, mut trees) = index_for(vec![
            tree(0, &[("a", "net/Alpha")]),
            tree(1, &[("q", "net/Alpha"), ("r", "net/Other")]),
        ])
        .await;

        let lineage = Namespace::new("lineage");
        // Three entities per class across three class appearances.
        assert_eq!(index.apply(&lineage, &mut trees).unwrap(), 9);
        assert_eq!(trees[1].class_name("q", "lineage"), Some("0"));
        assert_eq!(trees[1].class_name("r", "lineage"), Some("1"));
        let field = trees[1]
            .class("r")
            .and_then(|c| c.field(&FieldKey::new("f", Some("I".into()))))
            .unwrap();
        assert_eq!(field.name("lineage"), Some("1"));
        assert!(trees[0].has_namespace("lineage"));
    }

    #[tokio::test]
    async fn apply_rejects_reserved_namespaces_and_foreign_sequences() {
        let (index, mut trees) = index_for(vec![tree(0, &[("a", "net/Alpha")])]).await;

        assert!(matches!(
            index.apply(&Namespace::source(), &mut trees),
            Err(AncestryError::ReservedNamespace(_))
        ));
        assert!(matches!(
            index.apply(&Namespace::new("meta_index"), &mut trees),
            Err(AncestryError::ReservedNamespace(_))
        ));

        let mut other = vec![tree(5, &[("a", "net/Alpha")])];
        assert!(matches!(
            index.apply(&Namespace::new("lineage"), &mut other),
            Err(AncestryError::SequenceMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn summary_serializes() {
        let (index, _) = index_for(vec![tree(0, &[("a", "net/Alpha")])]).await;
        let json = serde_json::to_value(index.summary()).unwrap();
        assert_eq!(json["releases"][0], "r0");
        assert_eq!(json["classes"][0]["history"][0]["release"], "r0");
        assert_eq!(json["fields"][0]["owner"], 0);
        assert!(json["classes"][0].get("owner").is_none());
    }
}
