use std::collections::BTreeMap;

use crate::foundation::error::{CompgraphError, CompgraphResult};
use crate::foundation::ids::NodeId;
use crate::graph::node::ObjectGraph;
use crate::optimize::disjoint::check_disjoint;
use crate::scene::arena::Scene;
use crate::scene::model::{ObjectBody, ObjectKind, ObjectRef, SceneObject};

/// Counters of one copy run.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct CopyStats {
    /// Output objects created, per kind.
    pub constructed: BTreeMap<ObjectKind, usize>,
    /// References satisfied from an already materialized node.
    pub cache_hits: usize,
}

impl CopyStats {
    pub fn total_constructed(&self) -> usize {
        self.constructed.values().sum()
    }
}

/// Output of [`Copier::copy`].
#[derive(Debug)]
pub struct Copied {
    pub scene: Scene,
    pub root: ObjectRef,
    pub stats: CopyStats,
}

#[derive(Debug)]
enum Pending {
    /// Fill a reserved output slot from a source object.
    Fill { src: ObjectRef, out: ObjectRef },
    /// Copy values and animators into an owner-derived property set.
    Properties { src: ObjectRef, out: ObjectRef },
    /// Replay controller state onto an owner-derived controller.
    Controller { src: ObjectRef, out: ObjectRef },
}

/// Copies the canonical graph into a fresh scene, one output object per canonical node.
pub struct Copier<'a> {
    graph: &'a mut ObjectGraph,
    source: &'a Scene,
    out: Scene,
    pending: Vec<Pending>,
    stats: CopyStats,
}

impl<'a> Copier<'a> {
    fn new(graph: &'a mut ObjectGraph, source: &'a Scene) -> Self {
        Self {
            graph,
            source,
            out: Scene::new(),
            pending: Vec::new(),
            stats: CopyStats::default(),
        }
    }

    /// Copy the graph reachable from `root`. The disjointness post-check runs in debug builds.
    pub fn copy(
        graph: &'a mut ObjectGraph,
        source: &'a Scene,
        root: ObjectRef,
    ) -> CompgraphResult<Copied> {
        Self::copy_checked(graph, source, root, cfg!(debug_assertions))
    }

    /// Like [`Copier::copy`], with explicit control over the disjointness post-check.
    #[tracing::instrument(skip(graph, source))]
    pub fn copy_checked(
        graph: &'a mut ObjectGraph,
        source: &'a Scene,
        root: ObjectRef,
        validate_output: bool,
    ) -> CompgraphResult<Copied> {
        let mut copier = Copier::new(graph, source);
        let out_root = copier.materialize(root)?;
        copier.drain()?;

        let Copier { out, stats, .. } = copier;
        if validate_output {
            check_disjoint(source, root, &out, out_root)?;
        }
        tracing::debug!(
            constructed = stats.total_constructed(),
            cache_hits = stats.cache_hits,
            "graph copied"
        );
        Ok(Copied {
            scene: out,
            root: out_root,
            stats,
        })
    }

    /// Output object of the canonical node behind `src`, created on first request.
    ///
    /// The output identity is published through `copied_value` before any child is copied, so
    /// a reference reached again while the node is still pending resolves to the same object.
    fn materialize(&mut self, src: ObjectRef) -> CompgraphResult<ObjectRef> {
        let rep = self.graph.canonical(self.graph.require(src)?);
        if let Some(out) = self.graph.copied_value(rep) {
            self.stats.cache_hits += 1;
            return Ok(out);
        }

        let rep_ref = self.graph.node(rep).identity();
        let source = self.source;
        let obj = source.object(rep_ref)?;
        let out = match &obj.body {
            ObjectBody::PropertySet(p) if p.owner.is_some() => {
                let owner = self.owner_of(rep, rep_ref)?;
                let owner_out = self.materialize(owner)?;
                let out = self.out.ensure_properties(owner_out)?;
                self.pending.push(Pending::Properties { src: rep_ref, out });
                out
            }
            ObjectBody::AnimationController(c) => {
                let target = self.owner_of(rep, rep_ref)?;
                let target_out = self.materialize(target)?;
                let out = self.out.animation_controller(target_out, &c.property)?;
                self.pending.push(Pending::Controller { src: rep_ref, out });
                out
            }
            _ => {
                let out = self.out.reserve();
                self.pending.push(Pending::Fill { src: rep_ref, out });
                out
            }
        };
        // Materializing an owner never reaches back to this node, so the slot is still empty.
        self.graph.set_copied_value(rep, out)?;
        *self.stats.constructed.entry(obj.kind()).or_default() += 1;
        Ok(out)
    }

    fn owner_of(&self, id: NodeId, identity: ObjectRef) -> CompgraphResult<ObjectRef> {
        let owner = self.graph.node(id).owner().ok_or_else(|| {
            CompgraphError::invariant("owned-sub-object", identity, "owner is not in the graph")
        })?;
        Ok(self.graph.node(owner).identity())
    }

    fn copy_refs(&mut self, src: ObjectRef) -> CompgraphResult<SceneObject> {
        let mut obj = self.source.object(src)?.clone();
        obj.try_map_refs(&mut |_, r| self.materialize(r))?;
        Ok(obj)
    }

    /// Frozen animations need no further copying and must not be mutated.
    fn freeze_animations(&mut self, obj: &SceneObject) -> CompgraphResult<()> {
        for a in &obj.animators {
            self.out.freeze(a.animation)?;
        }
        Ok(())
    }

    fn drain(&mut self) -> CompgraphResult<()> {
        while let Some(task) = self.pending.pop() {
            match task {
                Pending::Fill { src, out } => {
                    let obj = self.copy_refs(src)?;
                    self.freeze_animations(&obj)?;
                    self.out.fill(out, obj)?;
                    if let Some(ps) = self.source.properties_of(src) {
                        self.materialize(ps)?;
                    }
                }
                Pending::Properties { src, out } => {
                    let obj = self.copy_refs(src)?;
                    self.freeze_animations(&obj)?;
                    let target = self.out.object_mut(out)?;
                    if let (ObjectBody::PropertySet(dst), ObjectBody::PropertySet(from)) =
                        (&mut target.body, obj.body)
                    {
                        dst.values = from.values;
                    }
                    target.description = obj.description;
                    target.animators = obj.animators;
                }
                Pending::Controller { src, out } => {
                    let obj = self.copy_refs(src)?;
                    self.freeze_animations(&obj)?;
                    let target = self.out.object_mut(out)?;
                    if let (ObjectBody::AnimationController(dst), ObjectBody::AnimationController(from)) =
                        (&mut target.body, obj.body)
                    {
                        dst.paused = from.paused;
                    }
                    target.description = obj.description;
                    target.animators = obj.animators;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/optimize/copier.rs"]
mod tests;
