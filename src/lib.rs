//! compgraph turns a declarative animation scene into a deduplicated object graph and plans
//! the code that rebuilds it through a target object-creation API.
//!
//! # Pipeline overview
//!
//! 1. **Build**: `Scene + root -> ObjectGraph` (one node per reachable identity, edges numbered
//!    in execution order)
//! 2. **Canonicalize**: merge structurally identical nodes into one representative per class
//! 3. **Copy**: materialize every representative once into a fresh, disjoint `Scene`
//! 4. **Reduce**: collapse pass-through containers of the copied tree
//! 5. **Plan**: decide factories, storage, inlining, names and call ordering, then drive an
//!    [`Emitter`] through [`generate`]
//!
//! Everything is single-threaded and per-run: graphs, caches and plans belong to one
//! invocation and are never shared between sessions.
#![forbid(unsafe_code)]

mod canon;
mod foundation;
mod graph;
mod optimize;
/// Code-generation planning and the emitter contract.
pub mod plan;
/// Scene object model, arena and file format.
pub mod scene;
mod session;

pub use crate::canon::canonicalizer::{CanonicalizeOpts, Canonicalization, canonicalize};
pub use crate::foundation::core::{
    Affine, BezPath, Color, PathEl, Point, Ticks, Vec2, Vector3, Vector4,
};
pub use crate::foundation::error::{CompgraphError, CompgraphResult};
pub use crate::foundation::hash::Fingerprint;
pub use crate::foundation::ids::{ClassId, NodeId, Position, VariantId};
pub use crate::foundation::sort::alphanumeric_cmp;
pub use crate::graph::node::{Edge, InEdge, Node, ObjectGraph};
pub use crate::optimize::copier::{Copied, Copier, CopyStats};
pub use crate::optimize::disjoint::check_disjoint;
pub use crate::optimize::reducer::{ReduceStats, Reduced, ReducerOpts, reduce};
pub use crate::plan::emit::{
    Emitter, FactoryHeader, FactoryRef, FieldDecl, ObjectContext, ResolvedRef, VariantHeader,
    generate,
};
pub use crate::plan::ordering::CallKind;
pub use crate::plan::planner::{
    CallSite, CodegenPlan, InlineThunk, NodeAnnotation, PlanReport, Planner, PlannerOpts,
    SharedNode, VariantPlan, plan_single,
};
pub use crate::plan::trace::{ReplayStats, Step, Trace, TraceEmitter};
pub use crate::scene::arena::Scene;
pub use crate::scene::file::SceneFile;
pub use crate::scene::model::{ObjectBody, ObjectKind, ObjectRef, Role, SceneObject};
pub use crate::session::optimizer::{OptimizeStats, Optimized, Optimizer};
pub use crate::session::opts::{OptimizerOpts, SessionOpts};
