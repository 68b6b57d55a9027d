use std::collections::{BTreeMap, HashMap};

use smallvec::SmallVec;

use crate::canon::signature::local_signature;
use crate::foundation::error::CompgraphResult;
use crate::foundation::ids::{ClassId, NodeId};
use crate::graph::node::ObjectGraph;
use crate::scene::arena::Scene;
use crate::scene::model::{ObjectBody, Role};

/// Options of the canonicalization pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CanonicalizeOpts {
    /// Exclude descriptive labels from structural equality.
    pub ignore_descriptive_fields: bool,
    /// Also merge visuals and shapes. Off by default: the target API gives each of them a
    /// single parent.
    pub merge_tree_kinds: bool,
}

/// Result of [`canonicalize`]: the equivalence classes of a graph.
#[derive(Clone, Debug)]
pub struct Canonicalization {
    class_of: Vec<ClassId>,
    members: Vec<Vec<NodeId>>,
    merged: usize,
}

impl Canonicalization {
    pub fn class_of(&self, id: NodeId) -> ClassId {
        self.class_of[id.index()]
    }

    /// Members of `class` in discovery order.
    pub fn members(&self, class: ClassId) -> &[NodeId] {
        &self.members[class.0 as usize]
    }

    pub fn class_count(&self) -> usize {
        self.members.len()
    }

    /// Nodes that were merged into another representative.
    pub fn merged(&self) -> usize {
        self.merged
    }
}

type RefinementKey = (Option<ClassId>, SmallVec<[(Role, ClassId); 4]>);

struct Refiner<'g> {
    graph: &'g ObjectGraph,
    class_of: Vec<ClassId>,
    members: Vec<Vec<NodeId>>,
}

impl Refiner<'_> {
    fn key(&self, id: NodeId) -> RefinementKey {
        let node = self.graph.node(id);
        let owner = node.owner().map(|o| self.class_of[o.index()]);
        let children = node
            .out_edges()
            .iter()
            .filter(|e| !e.role.is_derived())
            .map(|e| (e.role.clone(), self.class_of[e.target.index()]))
            .collect();
        (owner, children)
    }

    /// Split `class` by refinement key. Returns the nodes that moved to a new class.
    fn split(&mut self, class: ClassId) -> Vec<NodeId> {
        let members = std::mem::take(&mut self.members[class.0 as usize]);
        let mut groups: Vec<(RefinementKey, Vec<NodeId>)> = Vec::new();
        let mut group_of: HashMap<RefinementKey, usize> = HashMap::new();
        for &id in &members {
            let key = self.key(id);
            match group_of.get(&key) {
                Some(&g) => groups[g].1.push(id),
                None => {
                    group_of.insert(key.clone(), groups.len());
                    groups.push((key, vec![id]));
                }
            }
        }

        let mut moved = Vec::new();
        let mut groups = groups.into_iter().map(|(_, ids)| ids);
        // The group holding the lowest discovery index keeps the class id.
        if let Some(first) = groups.next() {
            self.members[class.0 as usize] = first;
        }
        for ids in groups {
            let fresh = ClassId(self.members.len() as u32);
            for &id in &ids {
                self.class_of[id.index()] = fresh;
                moved.push(id);
            }
            self.members.push(ids);
        }
        moved
    }

    fn run(&mut self) -> usize {
        let mut dirty: Vec<ClassId> = (0..self.members.len() as u32).map(ClassId).collect();
        let mut rounds = 0;
        while !dirty.is_empty() {
            rounds += 1;
            dirty.sort();
            dirty.dedup();
            let mut moved = Vec::new();
            for class in std::mem::take(&mut dirty) {
                if self.members[class.0 as usize].len() > 1 {
                    moved.extend(self.split(class));
                }
            }
            for id in moved {
                let node = self.graph.node(id);
                for e in node.in_edges() {
                    if !e.role.is_derived() {
                        dirty.push(self.class_of[e.source.index()]);
                    }
                }
                // Owned sub-objects compare through their owner's class.
                for e in node.out_edges() {
                    if e.role.is_implicit() {
                        dirty.push(self.class_of[e.target.index()]);
                    }
                }
            }
        }
        rounds
    }
}

/// Partition the graph into classes of structurally identical nodes and link every node to
/// its class representative.
///
/// Two nodes are equal when their kinds, local fields and (ordered, role-tagged) children
/// are equal, children compared by class. The partition is refined from local signatures
/// until stable, so shared substructure and parameter cycles are handled alike. The
/// representative of a class is its member with the lowest discovery index; owned property
/// sets and controllers take the matching sub-object of their owner's representative.
#[tracing::instrument(skip(graph, scene))]
pub fn canonicalize(
    graph: &mut ObjectGraph,
    scene: &Scene,
    opts: &CanonicalizeOpts,
) -> CompgraphResult<Canonicalization> {
    // Initial partition by local signature, classes numbered in discovery order.
    let mut initial: HashMap<Vec<u8>, ClassId> = HashMap::new();
    let mut class_of = Vec::with_capacity(graph.len());
    let mut members: Vec<Vec<NodeId>> = Vec::new();
    for (id, node) in graph.nodes() {
        let obj = scene.object(node.identity())?;
        let mut sig = local_signature(obj, opts.ignore_descriptive_fields)?;
        if node.kind().is_tree_kind() && !opts.merge_tree_kinds {
            sig.extend_from_slice(&id.0.to_le_bytes());
        }
        let class = *initial.entry(sig).or_insert_with(|| {
            members.push(Vec::new());
            ClassId(members.len() as u32 - 1)
        });
        members[class.0 as usize].push(id);
        class_of.push(class);
    }

    let mut refiner = Refiner {
        graph,
        class_of,
        members,
    };
    let rounds = refiner.run();
    let Refiner {
        class_of, members, ..
    } = refiner;

    // Splits preserve member order, so `members[c][0]` is the lowest discovery index.
    let mut canonical: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    for id in graph.ids() {
        if graph.node(id).owner().is_none() {
            canonical.insert(id, members[class_of[id.index()].0 as usize][0]);
        }
    }
    for id in graph.ids() {
        let Some(owner) = graph.node(id).owner() else {
            continue;
        };
        let rep_owner = canonical.get(&owner).copied().unwrap_or(owner);
        let rep = matching_sub_object(graph, scene, id, rep_owner)?.unwrap_or(id);
        canonical.insert(id, rep);
    }
    for (&id, &rep) in &canonical {
        graph.set_canonical(id, rep);
    }

    let merged = canonical.iter().filter(|(id, rep)| id != rep).count();
    tracing::debug!(
        classes = members.len(),
        merged,
        rounds,
        "canonicalization finished"
    );
    Ok(Canonicalization {
        class_of,
        members,
        merged,
    })
}

/// Sub-object of `rep_owner` playing the role `id` plays for its own owner.
fn matching_sub_object(
    graph: &ObjectGraph,
    scene: &Scene,
    id: NodeId,
    rep_owner: NodeId,
) -> CompgraphResult<Option<NodeId>> {
    let owner_ref = graph.node(rep_owner).identity();
    let found = match &scene.object(graph.node(id).identity())?.body {
        ObjectBody::PropertySet(_) => scene.properties_of(owner_ref),
        ObjectBody::AnimationController(c) => scene.controller_of(owner_ref, &c.property),
        _ => None,
    };
    Ok(found.and_then(|r| graph.node_of(r)))
}

#[cfg(test)]
#[path = "../../tests/unit/canon/canonicalizer.rs"]
mod tests;
