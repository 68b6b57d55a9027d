use std::collections::HashMap;

use smallvec::SmallVec;

use crate::foundation::error::{CompgraphError, CompgraphResult};
use crate::foundation::ids::{NodeId, Position};
use crate::scene::model::{ObjectKind, ObjectRef, Role};

/// Outgoing reference of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    /// Referenced node.
    pub target: NodeId,
    /// Slot or list the reference sits in.
    pub role: Role,
    /// Execution-order position of the reference.
    pub position: Position,
}

/// Incoming reference of a node, recorded in discovery order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InEdge {
    /// Referring node.
    pub source: NodeId,
    pub role: Role,
    pub position: Position,
}

/// One distinct object of the source structure.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) identity: ObjectRef,
    pub(crate) kind: ObjectKind,
    pub(crate) owner: Option<NodeId>,
    pub(crate) animated: bool,
    pub(crate) out_edges: SmallVec<[Edge; 4]>,
    pub(crate) in_edges: SmallVec<[InEdge; 2]>,
    pub(crate) canonical: NodeId,
    pub(crate) copied_value: Option<ObjectRef>,
}

impl Node {
    /// Source object this node stands for.
    pub fn identity(&self) -> ObjectRef {
        self.identity
    }

    /// Kind of the source object.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Owner node of an owned property set or controller.
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// `true` when the object carries at least one animator.
    pub fn is_animated(&self) -> bool {
        self.animated
    }

    /// Outgoing references in execution order.
    pub fn out_edges(&self) -> &[Edge] {
        &self.out_edges
    }

    /// Incoming references, ordered by position.
    pub fn in_edges(&self) -> &[InEdge] {
        &self.in_edges
    }

    /// Materialized output object, once the copier produced it.
    pub fn copied_value(&self) -> Option<ObjectRef> {
        self.copied_value
    }
}

/// Reachable object graph of one scene root.
///
/// Node ids are discovery indices: node 0 is the root and ids grow in the order the builder
/// first reached each identity. Graphs are per-run values; nothing here is cached globally.
#[derive(Clone, Debug)]
pub struct ObjectGraph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) index: HashMap<ObjectRef, NodeId>,
    pub(crate) edge_count: u32,
}

impl ObjectGraph {
    /// The root node, always discovered first.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of reachable identities.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never `true` for a built graph, which holds at least the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges registered, equal to the last assigned position.
    pub fn edge_count(&self) -> u32 {
        self.edge_count
    }

    /// Node `id`. Ids come from this graph; a foreign id panics.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Nodes in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Node ids in discovery order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Node built for `r`, if `r` is reachable from the root.
    pub fn node_of(&self, r: ObjectRef) -> Option<NodeId> {
        self.index.get(&r).copied()
    }

    /// Node built for `r`; an unknown identity is an invariant fault.
    pub fn require(&self, r: ObjectRef) -> CompgraphResult<NodeId> {
        self.node_of(r).ok_or_else(|| {
            CompgraphError::invariant("reachable", r, "identity is not part of the graph")
        })
    }

    /// Representative of `id`'s equivalence class (`id` itself before canonicalization).
    pub fn canonical(&self, id: NodeId) -> NodeId {
        self.nodes[id.index()].canonical
    }

    /// `true` when `id` represents its own class.
    pub fn is_canonical(&self, id: NodeId) -> bool {
        self.canonical(id) == id
    }

    pub(crate) fn set_canonical(&mut self, id: NodeId, rep: NodeId) {
        self.nodes[id.index()].canonical = rep;
    }

    /// Output object of `id`, once the copier published it.
    pub fn copied_value(&self, id: NodeId) -> Option<ObjectRef> {
        self.nodes[id.index()].copied_value
    }

    /// Publish the output object of `id`. A second assignment is an invariant fault.
    pub fn set_copied_value(&mut self, id: NodeId, value: ObjectRef) -> CompgraphResult<()> {
        let node = &mut self.nodes[id.index()];
        if let Some(prev) = node.copied_value {
            return Err(CompgraphError::invariant(
                "copied-once",
                node.identity,
                format!("copied value already set to {prev:?}, refusing {value:?}"),
            ));
        }
        node.copied_value = Some(value);
        Ok(())
    }

    /// Earliest edge into `id`; `None` for the root unless something references it.
    pub fn first_in_edge(&self, id: NodeId) -> Option<&InEdge> {
        self.nodes[id.index()].in_edges.first()
    }

    /// Earliest edge from `from` to `to`.
    pub fn first_edge_between(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.nodes[from.index()]
            .out_edges
            .iter()
            .find(|e| e.target == to)
    }

    /// Distinct referrers of `id` through non-derived edges, in first-reference order.
    pub fn parents(&self, id: NodeId) -> SmallVec<[NodeId; 2]> {
        let mut out: SmallVec<[NodeId; 2]> = SmallVec::new();
        for e in &self.nodes[id.index()].in_edges {
            if !e.role.is_derived() && !out.contains(&e.source) {
                out.push(e.source);
            }
        }
        out
    }
}
