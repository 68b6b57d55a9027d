use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::canon::signature::content_fingerprint;
use crate::foundation::error::{CompgraphError, CompgraphResult};
use crate::foundation::hash::Fingerprint;
use crate::foundation::ids::{NodeId, VariantId};
use crate::foundation::sort::alphanumeric_cmp;
use crate::graph::node::ObjectGraph;
use crate::plan::naming::{assign_names, base_name, claim_name, sanitize};
use crate::plan::ordering::{CallKind, CallOrdering};
use crate::scene::arena::Scene;
use crate::scene::model::{ObjectKind, ObjectRef};

/// Options of the code-generation planner.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlannerOpts {
    /// Write trivial single-use leaves at their use site instead of giving them a factory.
    pub inline_trivial: bool,
    /// Configure expression animations in place at every use instead of caching them.
    pub reuse_expression_animations: bool,
}

impl Default for PlannerOpts {
    fn default() -> Self {
        Self {
            inline_trivial: true,
            reuse_expression_animations: true,
        }
    }
}

/// Construction text of an inlined node, produced at most once on request.
#[derive(Debug, Default)]
pub struct InlineThunk {
    text: OnceCell<String>,
}

impl InlineThunk {
    /// Text of the inlined construction, evaluating `f` on first request only.
    pub fn text_or_try_init(
        &self,
        f: impl FnOnce() -> CompgraphResult<String>,
    ) -> CompgraphResult<&str> {
        if let Some(text) = self.text.get() {
            return Ok(text);
        }
        let text = f()?;
        Ok(self.text.get_or_init(|| text))
    }

    pub fn is_evaluated(&self) -> bool {
        self.text.get().is_some()
    }
}

/// How generated code obtains a node.
#[derive(Debug)]
pub enum CallSite {
    /// Named factory; stored nodes are kept in a field of the same name.
    Factory { name: String },
    /// Construction written directly at the single use site.
    Inline(InlineThunk),
    /// Part of `owner`; configured inside the owner's factory.
    Implicit { owner: NodeId },
    /// Transient helper configured in place at every use.
    Helper,
}

/// Planning decisions for one node.
#[derive(Debug)]
pub struct NodeAnnotation {
    pub needs_factory: bool,
    pub requires_storage: bool,
    pub inlined: bool,
    pub transient: bool,
    pub shared: bool,
    /// Weighted reference count; references made by a transient helper count once per use.
    pub refs: usize,
    pub call_site: CallSite,
}

impl NodeAnnotation {
    /// Factory (and field) name, for nodes that have one.
    pub fn name(&self) -> Option<&str> {
        match &self.call_site {
            CallSite::Factory { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_implicit(&self) -> bool {
        matches!(self.call_site, CallSite::Implicit { .. })
    }
}

/// Plan of one generated output variant.
#[derive(Debug)]
pub struct VariantPlan<'a> {
    id: VariantId,
    name: String,
    scene: &'a Scene,
    graph: ObjectGraph,
    annotations: Vec<NodeAnnotation>,
    ordering: CallOrdering,
}

impl<'a> VariantPlan<'a> {
    pub fn id(&self) -> VariantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    pub fn annotation(&self, id: NodeId) -> &NodeAnnotation {
        &self.annotations[id.index()]
    }

    /// Annotation of the node built for `r`.
    pub fn annotation_of(&self, r: ObjectRef) -> Option<&NodeAnnotation> {
        self.graph.node_of(r).map(|id| self.annotation(id))
    }

    /// Name of the factory the variant's entry point calls.
    pub fn root_factory(&self) -> CompgraphResult<&str> {
        self.annotation(self.graph.root()).name().ok_or_else(|| {
            CompgraphError::invariant("root-factory", self.graph.root(), "root has no factory")
        })
    }

    /// Variant-local factory nodes, in name order.
    pub fn factories(&self) -> Vec<NodeId> {
        let mut out: Vec<(NodeId, &str)> = self
            .graph
            .ids()
            .filter(|id| {
                let a = self.annotation(*id);
                a.needs_factory && !a.shared
            })
            .filter_map(|id| self.annotation(id).name().map(|n| (id, n)))
            .collect();
        out.sort_by(|a, b| alphanumeric_cmp(a.1, b.1));
        out.into_iter().map(|(id, _)| id).collect()
    }

    /// Variant-local stored nodes, in name order.
    pub fn stored(&self) -> Vec<NodeId> {
        self.factories()
            .into_iter()
            .filter(|id| self.annotation(*id).requires_storage)
            .collect()
    }

    /// Whether `caller` runs `callee`'s factory or reads it from storage.
    pub fn call_kind(&self, caller: NodeId, callee: NodeId) -> CompgraphResult<CallKind> {
        self.ordering
            .call_kind(&self.graph, caller, callee, self.annotation(callee).shared)
    }

    /// Ordering pairs decided so far.
    pub fn orderings_computed(&self) -> usize {
        self.ordering.computed()
    }
}

/// Asset created once at the outer scope and read by every variant that uses it.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SharedNode {
    pub name: String,
    pub kind: ObjectKind,
    pub fingerprint: Fingerprint,
    /// Every node standing for this asset, in variant then discovery order.
    pub users: Vec<(VariantId, NodeId)>,
}

/// Complete plan handed to [`crate::generate`].
#[derive(Debug)]
pub struct CodegenPlan<'a> {
    pub variants: Vec<VariantPlan<'a>>,
    pub shared: Vec<SharedNode>,
}

impl<'a> CodegenPlan<'a> {
    pub fn variant(&self, id: VariantId) -> &VariantPlan<'a> {
        &self.variants[id.index()]
    }

    pub fn report(&self) -> PlanReport {
        PlanReport::from_plan(self)
    }
}

/// Plans the code generation of one or more output variants.
#[derive(Debug)]
pub struct Planner<'a> {
    opts: PlannerOpts,
    variants: Vec<(String, &'a Scene, ObjectRef)>,
}

impl<'a> Planner<'a> {
    pub fn new(opts: PlannerOpts) -> Self {
        Self {
            opts,
            variants: Vec::new(),
        }
    }

    /// Register an output variant rooted at `root`.
    pub fn add_variant(
        &mut self,
        name: impl Into<String>,
        scene: &'a Scene,
        root: ObjectRef,
    ) -> CompgraphResult<VariantId> {
        let id = u16::try_from(self.variants.len())
            .map_err(|_| CompgraphError::validation("too many output variants"))?;
        self.variants.push((name.into(), scene, root));
        Ok(VariantId(id))
    }

    #[tracing::instrument(skip(self), fields(variants = self.variants.len()))]
    pub fn plan(self) -> CompgraphResult<CodegenPlan<'a>> {
        let mut variants = Vec::with_capacity(self.variants.len());
        for (i, (name, scene, root)) in self.variants.into_iter().enumerate() {
            let id = VariantId(i as u16);
            let graph = ObjectGraph::build(scene, root)?;
            let annotations = annotate(&graph, scene, &self.opts)?;
            variants.push(VariantPlan {
                id,
                name,
                scene,
                graph,
                annotations,
                ordering: CallOrdering::new(),
            });
        }

        let (shared, shared_names) = name_shared(&mut variants)?;
        for variant in &mut variants {
            name_variant(variant, &shared_names)?;
        }

        tracing::debug!(
            variants = variants.len(),
            shared = shared.len(),
            factories = variants.iter().map(|v| v.factories().len()).sum::<usize>(),
            "code generation planned"
        );
        Ok(CodegenPlan { variants, shared })
    }
}

/// Plan a single variant named `"main"`.
pub fn plan_single<'a>(
    scene: &'a Scene,
    root: ObjectRef,
    opts: &PlannerOpts,
) -> CompgraphResult<CodegenPlan<'a>> {
    let mut planner = Planner::new(opts.clone());
    planner.add_variant("main", scene, root)?;
    planner.plan()
}

struct Flags {
    transient: bool,
    implicit: Option<NodeId>,
    shared: bool,
}

/// Factories (or inlined nodes) in which `id` is written, once per use.
///
/// A helper is configured in the host of every user; an owned sub-object in its owner's host.
fn hosts_of(
    graph: &ObjectGraph,
    flags: &[Flags],
    id: NodeId,
    memo: &mut HashMap<NodeId, Vec<NodeId>>,
    visiting: &mut HashSet<NodeId>,
) -> Vec<NodeId> {
    if let Some(hosts) = memo.get(&id) {
        return hosts.clone();
    }
    let f = &flags[id.index()];
    if !f.transient && f.implicit.is_none() {
        return vec![id];
    }
    if !visiting.insert(id) {
        return Vec::new();
    }
    let hosts = match f.implicit {
        Some(owner) if !f.transient => hosts_of(graph, flags, owner, memo, visiting),
        _ => {
            let mut hosts = Vec::new();
            for e in graph.node(id).in_edges() {
                hosts.extend(hosts_of(graph, flags, e.source, memo, visiting));
            }
            hosts
        }
    };
    visiting.remove(&id);
    // Results computed inside a helper cycle are partial.
    if visiting.is_empty() {
        memo.insert(id, hosts.clone());
    }
    hosts
}

/// Uses of `id` that resolve to a call or a storage read.
///
/// A reference made by a helper counts once per host the helper is configured in, except in
/// `id`'s own factory, where it resolves to the object under construction.
fn weighted_uses(
    graph: &ObjectGraph,
    flags: &[Flags],
    id: NodeId,
    hosts: &mut HashMap<NodeId, Vec<NodeId>>,
) -> usize {
    let mut uses = usize::from(id == graph.root());
    for e in graph.node(id).in_edges() {
        uses += if flags[e.source.index()].transient {
            let mut visiting = HashSet::new();
            hosts_of(graph, flags, e.source, hosts, &mut visiting)
                .into_iter()
                .filter(|h| *h != id)
                .count()
        } else {
            1
        };
    }
    uses
}

fn annotate(
    graph: &ObjectGraph,
    scene: &Scene,
    opts: &PlannerOpts,
) -> CompgraphResult<Vec<NodeAnnotation>> {
    let root = graph.root();
    let flags: Vec<Flags> = graph
        .nodes()
        .map(|(id, n)| Flags {
            transient: opts.reuse_expression_animations
                && n.kind() == ObjectKind::ExpressionAnimation
                && id != root,
            implicit: n.owner(),
            shared: n.kind().is_shared_asset() && id != root,
        })
        .collect();

    let mut hosts = HashMap::new();
    let mut out = Vec::with_capacity(graph.len());
    for (id, node) in graph.nodes() {
        let f = &flags[id.index()];
        let refs = weighted_uses(graph, &flags, id, &mut hosts);
        if refs == 0 && !f.transient {
            return Err(CompgraphError::invariant(
                "reachable",
                id,
                "non-root node without references",
            ));
        }

        let annotation = if let Some(owner) = f.implicit {
            NodeAnnotation {
                needs_factory: false,
                requires_storage: false,
                inlined: false,
                transient: false,
                shared: false,
                refs,
                call_site: CallSite::Implicit { owner },
            }
        } else if f.transient {
            NodeAnnotation {
                needs_factory: false,
                requires_storage: false,
                inlined: false,
                transient: true,
                shared: false,
                refs,
                call_site: CallSite::Helper,
            }
        } else {
            let inlined = opts.inline_trivial
                && node.kind().is_inlinable()
                && refs == 1
                && !node.is_animated()
                && scene.properties_of(node.identity()).is_none()
                && id != root
                && !f.shared;
            NodeAnnotation {
                needs_factory: !inlined,
                requires_storage: !inlined && (f.shared || refs > 1),
                inlined,
                transient: false,
                shared: f.shared,
                refs,
                call_site: if inlined {
                    CallSite::Inline(InlineThunk::default())
                } else {
                    // Named by the naming passes.
                    CallSite::Factory {
                        name: String::new(),
                    }
                },
            }
        };
        out.push(annotation);
    }
    Ok(out)
}

fn name_shared(
    variants: &mut [VariantPlan<'_>],
) -> CompgraphResult<(Vec<SharedNode>, HashSet<String>)> {
    let mut by_fingerprint: BTreeMap<Fingerprint, usize> = BTreeMap::new();
    let mut shared: Vec<SharedNode> = Vec::new();
    let mut labels: Vec<Option<String>> = Vec::new();

    for v in variants.iter() {
        for id in v.graph.ids() {
            if !v.annotations[id.index()].shared {
                continue;
            }
            let obj = v.scene.object(v.graph.node(id).identity())?;
            let fingerprint = content_fingerprint(obj)?;
            let slot = *by_fingerprint.entry(fingerprint).or_insert_with(|| {
                shared.push(SharedNode {
                    name: String::new(),
                    kind: obj.kind(),
                    fingerprint,
                    users: Vec::new(),
                });
                labels.push(None);
                shared.len() - 1
            });
            shared[slot].users.push((v.id, id));
            if let Some(label) = obj.description.short.as_deref().and_then(sanitize) {
                let best = &mut labels[slot];
                if best.as_ref().is_none_or(|b| label < *b) {
                    *best = Some(label);
                }
            }
        }
    }

    // Smallest label across users, claimed in fingerprint order: independent of variant order.
    let mut taken = HashSet::new();
    for slot in by_fingerprint.values() {
        let node = &shared[*slot];
        let base = labels[*slot].clone().unwrap_or_else(|| {
            format!("{}_{}", node.kind.name(), node.fingerprint.short_hex())
        });
        shared[*slot].name = claim_name(&base, &mut taken);
    }

    for node in &shared {
        for (variant, id) in &node.users {
            variants[variant.index()].annotations[id.index()].call_site = CallSite::Factory {
                name: node.name.clone(),
            };
        }
    }
    Ok((shared, taken))
}

fn name_variant(variant: &mut VariantPlan<'_>, shared_names: &HashSet<String>) -> CompgraphResult<()> {
    let mut candidates = Vec::new();
    for (id, node) in variant.graph.nodes() {
        let a = &variant.annotations[id.index()];
        if a.needs_factory && !a.shared {
            candidates.push((id, base_name(variant.scene.object(node.identity())?)));
        }
    }
    let mut taken = shared_names.clone();
    let names = assign_names(&candidates, &mut taken);
    for (id, name) in names {
        variant.annotations[id.index()].call_site = CallSite::Factory { name };
    }
    tracing::debug!(
        variant = %variant.name,
        factories = candidates.len(),
        "factories named"
    );
    Ok(())
}

/// Serializable summary of a plan.
#[derive(Clone, Debug, serde::Serialize)]
pub struct PlanReport {
    pub variants: Vec<VariantReport>,
    pub shared: Vec<SharedNode>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct VariantReport {
    pub name: String,
    pub root_factory: Option<String>,
    pub factories: usize,
    pub stored: usize,
    pub inlined: usize,
    pub helpers: usize,
    pub nodes: Vec<NodeReport>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct NodeReport {
    pub node: NodeId,
    pub kind: ObjectKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub refs: usize,
    pub needs_factory: bool,
    pub requires_storage: bool,
    pub inlined: bool,
    pub transient: bool,
    pub shared: bool,
    pub implicit: bool,
}

impl PlanReport {
    pub fn from_plan(plan: &CodegenPlan<'_>) -> Self {
        let variants = plan
            .variants
            .iter()
            .map(|v| {
                let nodes: Vec<NodeReport> = v
                    .graph
                    .nodes()
                    .map(|(id, n)| {
                        let a = v.annotation(id);
                        NodeReport {
                            node: id,
                            kind: n.kind(),
                            name: a.name().map(str::to_string),
                            refs: a.refs,
                            needs_factory: a.needs_factory,
                            requires_storage: a.requires_storage,
                            inlined: a.inlined,
                            transient: a.transient,
                            shared: a.shared,
                            implicit: a.is_implicit(),
                        }
                    })
                    .collect();
                VariantReport {
                    name: v.name.clone(),
                    root_factory: v.root_factory().ok().map(str::to_string),
                    factories: v.factories().len(),
                    stored: v.stored().len(),
                    inlined: nodes.iter().filter(|n| n.inlined).count(),
                    helpers: nodes.iter().filter(|n| n.transient).count(),
                    nodes,
                }
            })
            .collect();
        Self {
            variants,
            shared: plan.shared.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/planner.rs"]
mod tests;
