use crate::canon::canonicalizer::canonicalize;
use crate::foundation::error::CompgraphResult;
use crate::graph::node::ObjectGraph;
use crate::optimize::copier::Copier;
use crate::optimize::reducer::reduce;
use crate::plan::planner::{CodegenPlan, Planner, PlannerOpts};
use crate::scene::arena::Scene;
use crate::scene::model::ObjectRef;
use crate::session::opts::OptimizerOpts;

/// Counters of one optimization run.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct OptimizeStats {
    /// Nodes of the input graph.
    pub nodes: usize,
    /// Equivalence classes found by canonicalization.
    pub classes: usize,
    /// Nodes merged into another representative.
    pub merged: usize,
    /// Objects created in the output scene.
    pub copied: usize,
    /// References satisfied from an already copied node.
    pub cache_hits: usize,
    /// Containers replaced by their single child.
    pub elided: usize,
    /// Containers whose children moved into their parent.
    pub absorbed: usize,
}

/// Deduplicated, reduced output of [`Optimizer::optimize`].
#[derive(Debug)]
pub struct Optimized {
    pub scene: Scene,
    pub root: ObjectRef,
    pub stats: OptimizeStats,
}

/// One optimization session: build, canonicalize, copy, reduce.
///
/// Every run builds its own graph and caches. Nothing is kept between runs, so one optimizer
/// can process unrelated scenes.
#[derive(Clone, Debug, Default)]
pub struct Optimizer {
    opts: OptimizerOpts,
}

impl Optimizer {
    pub fn new(opts: OptimizerOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> &OptimizerOpts {
        &self.opts
    }

    /// Produce a new scene equivalent to the one rooted at `root`, with structurally equal
    /// objects merged and pass-through containers collapsed. `scene` is left untouched.
    #[tracing::instrument(skip(self, scene))]
    pub fn optimize(&self, scene: &Scene, root: ObjectRef) -> CompgraphResult<Optimized> {
        let mut graph = ObjectGraph::build(scene, root)?;
        let canon = canonicalize(&mut graph, scene, &self.opts.canonicalize)?;
        let validate = self.opts.validate_output || cfg!(debug_assertions);
        let copied = Copier::copy_checked(&mut graph, scene, root, validate)?;

        let mut out = copied.scene;
        let reduced = reduce(&mut out, copied.root, &self.opts.reducer)?;

        let stats = OptimizeStats {
            nodes: graph.len(),
            classes: canon.class_count(),
            merged: canon.merged(),
            copied: copied.stats.total_constructed(),
            cache_hits: copied.stats.cache_hits,
            elided: reduced.stats.elided,
            absorbed: reduced.stats.absorbed,
        };
        tracing::debug!(?stats, "scene optimized");
        Ok(Optimized {
            scene: out,
            root: reduced.root,
            stats,
        })
    }

    /// Plan code generation for already optimized variants, named in order.
    pub fn plan_variants<'a>(
        variants: &'a [(String, Optimized)],
        opts: &PlannerOpts,
    ) -> CompgraphResult<CodegenPlan<'a>> {
        let mut planner = Planner::new(opts.clone());
        for (name, optimized) in variants {
            planner.add_variant(name.clone(), &optimized.scene, optimized.root)?;
        }
        planner.plan()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/optimizer.rs"]
mod tests;
