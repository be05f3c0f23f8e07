//! The release-by-release lineage scan shared by every entity kind.

use std::collections::HashMap;
use std::fmt::Debug;

use mapping_types::Namespace;
use tracing::{debug, warn};

use crate::node::{AncestryNode, EntityKind};
use crate::options::AncestryOptions;
use crate::signature::{compatibility, Signature};

struct OpenNode<K> {
    node: AncestryNode<K>,
    last: Signature,
    seen_at: usize,
}

/// Incremental lineage scan over one ordered sequence of entity sets.
///
/// Open nodes are kept in creation order, which is also the tie-break order
/// when several nodes match an entity equally well.
pub struct LineageScan<'o, K> {
    kind: EntityKind,
    scope: String,
    options: &'o AncestryOptions,
    open: Vec<OpenNode<K>>,
    next_seq: usize,
    last_step: Option<usize>,
}

impl<'o, K: Debug> LineageScan<'o, K> {
    pub fn new(kind: EntityKind, scope: impl Into<String>, options: &'o AncestryOptions) -> Self {
        Self {
            kind,
            scope: scope.into(),
            options,
            open: Vec::new(),
            next_seq: 0,
            last_step: None,
        }
    }

    /// Number of nodes created so far.
    pub fn created(&self) -> usize {
        self.next_seq
    }

    /// Feed the entities of release `ordinal`, in enumeration order.
    ///
    /// Each open node claims at most one entity. Returns the nodes sealed by
    /// this step: open nodes that found no entity in `ordinal`.
    pub fn step(&mut self, ordinal: usize, entities: Vec<(K, Signature)>) -> Vec<AncestryNode<K>> {
        // A gap in the sequence seals everything still open.
        let mut sealed = match self.last_step {
            Some(previous) if previous + 1 != ordinal => self.drain(),
            _ => Vec::new(),
        };
        self.last_step = Some(ordinal);

        let assignment = self.assign(ordinal, &entities);
        for ((key, signature), slot) in entities.into_iter().zip(assignment) {
            match slot {
                Some(slot) => {
                    let open = &mut self.open[slot];
                    open.node.extend(ordinal, key);
                    open.last = signature;
                    open.seen_at = ordinal;
                }
                None => {
                    self.open.push(OpenNode {
                        node: AncestryNode::open(self.next_seq, ordinal, key),
                        last: signature,
                        seen_at: ordinal,
                    });
                    self.next_seq += 1;
                }
            }
        }

        for open in std::mem::take(&mut self.open) {
            if open.seen_at == ordinal {
                self.open.push(open);
            } else {
                sealed.push(open.node);
            }
        }
        sealed
    }

    /// Seal every node still open.
    pub fn finish(mut self) -> Vec<AncestryNode<K>> {
        self.drain()
    }

    fn drain(&mut self) -> Vec<AncestryNode<K>> {
        self.open.drain(..).map(|open| open.node).collect()
    }

    /// Pick an open node for every entity, or `None` to open a new one.
    fn assign(&self, ordinal: usize, entities: &[(K, Signature)]) -> Vec<Option<usize>> {
        let mut by_name: HashMap<(&Namespace, &str), Vec<usize>> = HashMap::new();
        for (slot, open) in self.open.iter().enumerate() {
            for (ns, identity) in &open.last {
                by_name.entry((ns, identity.as_str())).or_default().push(slot);
            }
        }

        let mut claimed = vec![false; self.open.len()];
        let mut assignment = Vec::with_capacity(entities.len());
        for (key, signature) in entities {
            let mut candidates: Vec<usize> = signature
                .iter()
                .filter_map(|(ns, identity)| by_name.get(&(ns, identity.as_str())))
                .flatten()
                .copied()
                .filter(|slot| !claimed[*slot])
                .collect();
            candidates.sort_unstable();
            candidates.dedup();

            let mut best: Option<(usize, usize)> = None;
            let mut ties = 0;
            for slot in candidates {
                let Some(score) = compatibility(self.options, &self.open[slot].last, signature)
                else {
                    continue;
                };
                if score < self.options.min_matching_namespaces {
                    continue;
                }
                match best {
                    Some((top, _)) if score < top => {}
                    Some((top, _)) if score == top => ties += 1,
                    _ => {
                        best = Some((score, slot));
                        ties = 0;
                    }
                }
            }

            if let Some((score, slot)) = best {
                if ties > 0 {
                    warn!(
                        kind = %self.kind,
                        scope = %self.scope,
                        release = ordinal,
                        entity = ?key,
                        score,
                        candidates = ties + 1,
                        "Ambiguous lineage match, keeping the earliest node"
                    );
                }
                claimed[slot] = true;
            } else {
                debug!(
                    kind = %self.kind,
                    scope = %self.scope,
                    release = ordinal,
                    entity = ?key,
                    "Opening new lineage"
                );
            }
            assignment.push(best.map(|(_, slot)| slot));
        }
        assignment
    }
}
