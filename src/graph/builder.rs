use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use crate::foundation::error::{CompgraphError, CompgraphResult};
use crate::foundation::ids::{NodeId, Position};
use crate::graph::node::{Edge, InEdge, Node, ObjectGraph};
use crate::scene::arena::Scene;
use crate::scene::model::{ObjectRef, Role};

struct Frame {
    node: NodeId,
    identity: ObjectRef,
    edges: Vec<(Role, ObjectRef)>,
    next: usize,
    // Edge waiting for the owner lookup registered just before it.
    deferred: Option<(Role, ObjectRef)>,
}

struct GraphBuilder<'a> {
    scene: &'a Scene,
    nodes: Vec<Node>,
    index: HashMap<ObjectRef, NodeId>,
    next_position: u32,
    stack: Vec<Frame>,
    // Owned sub-objects first reached from a non-owner; descended from their owner later.
    undescended: HashSet<NodeId>,
}

impl<'a> GraphBuilder<'a> {
    fn new(scene: &'a Scene) -> Self {
        Self {
            scene,
            nodes: Vec::new(),
            index: HashMap::new(),
            next_position: 1,
            stack: Vec::new(),
            undescended: HashSet::new(),
        }
    }

    /// Create the node of `r`; schedule its out-edges when `descend` is set.
    fn discover(&mut self, r: ObjectRef, descend: bool) -> CompgraphResult<NodeId> {
        let obj = self.scene.object(r)?;
        let id = NodeId(u32::try_from(self.nodes.len()).map_err(|_| {
            CompgraphError::invariant("node-count", r, "graph exceeds u32 nodes")
        })?);

        self.nodes.push(Node {
            identity: r,
            kind: obj.kind(),
            owner: None,
            animated: !obj.animators.is_empty(),
            out_edges: SmallVec::new(),
            in_edges: SmallVec::new(),
            canonical: id,
            copied_value: None,
        });
        self.index.insert(r, id);
        if descend {
            self.descend(id)?;
        } else {
            self.undescended.insert(id);
        }
        Ok(id)
    }

    fn descend(&mut self, id: NodeId) -> CompgraphResult<()> {
        let r = self.nodes[id.index()].identity;
        let mut edges = self.scene.object(r)?.refs();
        if let Some(ps) = self.scene.properties_of(r) {
            edges.push((Role::Properties, ps));
        }
        self.stack.push(Frame {
            node: id,
            identity: r,
            edges,
            next: 0,
            deferred: None,
        });
        Ok(())
    }

    /// Register `from -> to` at the next position, descending into `to` if it is new.
    fn connect(&mut self, from: NodeId, to: ObjectRef, role: Role) -> CompgraphResult<()> {
        self.scene.check_ref(to)?;
        let position = Position(self.next_position);
        self.next_position += 1;

        // Owned sub-objects are descended only through their owner's own edge.
        let from_identity = self.nodes[from.index()].identity;
        let from_owner = self
            .scene
            .object(to)?
            .body
            .owner()
            .is_none_or(|owner| owner == from_identity);
        let target = match self.index.get(&to) {
            Some(&id) => {
                if from_owner && self.undescended.remove(&id) {
                    self.descend(id)?;
                }
                id
            }
            None => self.discover(to, from_owner)?,
        };
        self.nodes[from.index()].out_edges.push(Edge {
            target,
            role: role.clone(),
            position,
        });
        self.nodes[target.index()].in_edges.push(InEdge {
            source: from,
            role,
            position,
        });
        Ok(())
    }

    fn run(mut self, root: ObjectRef) -> CompgraphResult<ObjectGraph> {
        if self.scene.object(root)?.body.is_owned() {
            return Err(CompgraphError::invariant(
                "owned-root",
                root,
                "an owned sub-object cannot be a graph root",
            ));
        }
        self.discover(root, true)?;

        loop {
            let Some(frame) = self.stack.last_mut() else {
                // Sub-objects whose owner never referenced them still need their edges.
                let Some(&id) = self.undescended.iter().min() else {
                    break;
                };
                self.undescended.remove(&id);
                self.descend(id)?;
                continue;
            };
            let from = frame.node;
            let from_identity = frame.identity;
            let (role, child, lookup_done) = if let Some((role, child)) = frame.deferred.take() {
                (role, child, true)
            } else if frame.next < frame.edges.len() {
                let (role, child) = frame.edges[frame.next].clone();
                frame.next += 1;
                (role, child, false)
            } else {
                self.stack.pop();
                continue;
            };

            if !lookup_done {
                let owner = self.scene.object(child)?.body.owner();
                if let Some(owner) = owner
                    && owner != from_identity
                {
                    if let Some(frame) = self.stack.last_mut() {
                        frame.deferred = Some((role, child));
                    }
                    self.connect(from, owner, Role::OwnerLookup)?;
                    continue;
                }
            }
            self.connect(from, child, role)?;
        }

        for i in 0..self.nodes.len() {
            let identity = self.nodes[i].identity;
            if let Some(owner) = self.scene.object(identity)?.body.owner() {
                let owner_id = self.index.get(&owner).copied().ok_or_else(|| {
                    CompgraphError::invariant("owner-reachable", identity, "owner was never visited")
                })?;
                self.nodes[i].owner = Some(owner_id);
            }
        }

        Ok(ObjectGraph {
            nodes: self.nodes,
            index: self.index,
            edge_count: self.next_position - 1,
        })
    }
}

impl ObjectGraph {
    /// Walk everything reachable from `root` in the order generated code executes.
    ///
    /// Each reference becomes an out-edge of the referrer and an in-edge of the referent at the
    /// next position. Identities are visited once; owner and controller-target back-references
    /// are never followed.
    #[tracing::instrument(skip(scene))]
    pub fn build(scene: &Scene, root: ObjectRef) -> CompgraphResult<ObjectGraph> {
        let graph = GraphBuilder::new(scene).run(root)?;
        tracing::debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            "object graph built"
        );
        Ok(graph)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/builder.rs"]
mod tests;
