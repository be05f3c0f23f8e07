//! Class lineage followed by per-node field and method lineage.
//!
//! The class scan runs on a blocking thread and streams each class node over
//! a channel as soon as it is sealed. Every received node spawns one field
//! scan and one method scan; the resolver returns once the class scan and all
//! member scans have joined.

use std::collections::BTreeMap;
use std::sync::Arc;

use mapping_types::MappingTree;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::error::{AncestryError, AncestryResult};
use crate::matcher::LineageScan;
use crate::node::{AncestrySet, ClassNode, EntityKind, FieldNode, MethodNode};
use crate::options::AncestryOptions;
use crate::signature::{class_signature, field_signature, method_signature};

enum MemberLineage {
    Fields(usize, Vec<FieldNode>),
    Methods(usize, Vec<MethodNode>),
}

#[derive(Clone, Debug, Default)]
pub struct AncestryResolver {
    options: Arc<AncestryOptions>,
}

impl AncestryResolver {
    pub fn new(options: AncestryOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &AncestryOptions {
        &self.options
    }

    /// Compute the lineage of every class, field and method in `trees`,
    /// which must be in release order.
    pub async fn resolve(&self, trees: Arc<[Arc<MappingTree>]>) -> AncestryResult<AncestrySet> {
        if trees.is_empty() {
            return Err(AncestryError::EmptySequence);
        }

        let (sealed_tx, mut sealed_rx) = mpsc::unbounded_channel::<ClassNode>();
        let class_scan = {
            let trees = Arc::clone(&trees);
            let options = Arc::clone(&self.options);
            tokio::task::spawn_blocking(move || {
                scan_classes(&trees, &options, |node| {
                    if sealed_tx.send(node).is_err() {
                        debug!("Class lineage receiver dropped");
                    }
                })
            })
        };

        let mut members = JoinSet::new();
        let mut classes = Vec::new();
        while let Some(node) = sealed_rx.recv().await {
            let node = Arc::new(node);
            {
                let trees = Arc::clone(&trees);
                let options = Arc::clone(&self.options);
                let node = Arc::clone(&node);
                members.spawn_blocking(move || {
                    MemberLineage::Fields(node.seq(), scan_fields(&trees, &node, &options))
                });
            }
            {
                let trees = Arc::clone(&trees);
                let options = Arc::clone(&self.options);
                let node = Arc::clone(&node);
                members.spawn_blocking(move || {
                    MemberLineage::Methods(node.seq(), scan_methods(&trees, &node, &options))
                });
            }
            classes.push(node);
        }

        class_scan
            .await
            .map_err(|e| AncestryError::Task(format!("class lineage: {e}")))?;

        let mut fields = BTreeMap::new();
        let mut methods = BTreeMap::new();
        while let Some(joined) = members.join_next().await {
            match joined.map_err(|e| AncestryError::Task(format!("member lineage: {e}")))? {
                MemberLineage::Fields(seq, nodes) => {
                    fields.insert(seq, nodes);
                }
                MemberLineage::Methods(seq, nodes) => {
                    methods.insert(seq, nodes);
                }
            }
        }

        let mut classes: Vec<ClassNode> = classes
            .into_iter()
            .map(|node| Arc::try_unwrap(node).unwrap_or_else(|shared| (*shared).clone()))
            .collect();
        classes.sort_by_key(ClassNode::seq);

        let set = AncestrySet {
            releases: trees.iter().map(|t| t.release().id.clone()).collect(),
            classes,
            fields,
            methods,
        };
        info!(
            releases = set.releases.len(),
            classes = set.class_count(),
            fields = set.field_count(),
            methods = set.method_count(),
            "Resolved ancestry"
        );
        Ok(set)
    }
}

/// Scan class lineage over the whole sequence, handing each node to `sealed`
/// as soon as it closes. Returns the number of nodes created.
pub fn scan_classes(
    trees: &[Arc<MappingTree>],
    options: &AncestryOptions,
    mut sealed: impl FnMut(ClassNode),
) -> usize {
    let mut scan = LineageScan::new(EntityKind::Class, "classes", options);
    for (ordinal, tree) in trees.iter().enumerate() {
        let entities: Vec<_> = tree
            .classes()
            .map(|class| (class.source.clone(), class_signature(class, options)))
            .collect();
        scan.step(ordinal, entities).into_iter().for_each(&mut sealed);
    }
    let created = scan.created();
    scan.finish().into_iter().for_each(&mut sealed);
    created
}

/// Field lineage within one class lineage, ordered by creation.
pub fn scan_fields(
    trees: &[Arc<MappingTree>],
    class: &ClassNode,
    options: &AncestryOptions,
) -> Vec<FieldNode> {
    let scope = class_scope(class);
    let mut scan = LineageScan::new(EntityKind::Field, scope, options);
    let mut nodes = Vec::new();
    for (ordinal, source) in class.entries() {
        let entities: Vec<_> = trees
            .get(*ordinal)
            .and_then(|tree| tree.class(source))
            .map(|entity| {
                entity
                    .fields
                    .values()
                    .map(|field| (field.key(), field_signature(field, options)))
                    .collect()
            })
            .unwrap_or_default();
        nodes.extend(scan.step(*ordinal, entities));
    }
    nodes.extend(scan.finish());
    nodes.sort_by_key(FieldNode::seq);
    nodes
}

/// Method lineage within one class lineage, ordered by creation.
pub fn scan_methods(
    trees: &[Arc<MappingTree>],
    class: &ClassNode,
    options: &AncestryOptions,
) -> Vec<MethodNode> {
    let scope = class_scope(class);
    let mut scan = LineageScan::new(EntityKind::Method, scope, options);
    let mut nodes = Vec::new();
    for (ordinal, source) in class.entries() {
        let entities: Vec<_> = trees
            .get(*ordinal)
            .and_then(|tree| tree.class(source).map(|entity| (tree, entity)))
            .map(|(tree, entity)| {
                entity
                    .methods
                    .values()
                    .filter(|method| options.constructor_mode.admits(method))
                    .map(|method| {
                        (method.key(), method_signature(tree, entity, method, options))
                    })
                    .collect()
            })
            .unwrap_or_default();
        nodes.extend(scan.step(*ordinal, entities));
    }
    nodes.extend(scan.finish());
    nodes.sort_by_key(MethodNode::seq);
    nodes
}

fn class_scope(class: &ClassNode) -> String {
    match class.first() {
        Some((ordinal, source)) => format!("{source}@{ordinal}"),
        None => format!("#{}", class.seq()),
    }
}
