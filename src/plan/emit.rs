//! Generation driver: walks a [`CodegenPlan`] and feeds an [`Emitter`].
//!
//! The driver owns every ordering decision. An emitter only spells what it is handed: field
//! declarations, factory boundaries and object contexts whose references are already resolved
//! to a call, a storage read, an inline expression or a path through the object being built.

use crate::foundation::error::{CompgraphError, CompgraphResult};
use crate::foundation::ids::{NodeId, Position, VariantId};
use crate::graph::node::Edge;
use crate::plan::ordering::CallKind;
use crate::plan::planner::{CallSite, CodegenPlan, NodeAnnotation, VariantPlan};
use crate::scene::model::{ObjectBody, ObjectKind, PathData, Role, SceneObject};

/// How a reference is obtained at its use site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactoryRef {
    /// Run the named factory; this is the callee's first use.
    Call { name: String },
    /// Read the already created object from its field.
    Read { field: String },
    /// Construction expression written in place.
    Inline { text: String },
    /// Property set of the object reached through `owner`.
    OwnerProperties { owner: Box<FactoryRef> },
    /// Controller of `property` on the object reached through `target`.
    Controller {
        target: Box<FactoryRef>,
        property: String,
    },
    /// The object under construction.
    This,
    /// Transient helper configured in place; see [`ResolvedRef::config`].
    Helper { node: NodeId },
}

/// One outgoing reference of an object, resolved for the current factory.
#[derive(Debug)]
pub struct ResolvedRef<'a> {
    pub role: Role,
    pub target: NodeId,
    pub via: FactoryRef,
    /// In-place configuration of an owned sub-object or a transient helper, written at this
    /// reference.
    pub config: Option<Box<ObjectContext<'a>>>,
}

/// Everything an emitter needs to write the construction of one object.
#[derive(Debug)]
pub struct ObjectContext<'a> {
    /// `None` for shared assets, which live outside every variant.
    pub variant: Option<VariantId>,
    pub node: NodeId,
    pub object: &'a SceneObject,
    pub annotation: &'a NodeAnnotation,
    /// Outgoing references in execution order. Owner lookups are folded into the reference
    /// they precede.
    pub refs: Vec<ResolvedRef<'a>>,
}

impl ObjectContext<'_> {
    pub fn kind(&self) -> ObjectKind {
        self.object.kind()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct VariantHeader<'a> {
    pub id: VariantId,
    pub name: &'a str,
    pub root_factory: &'a str,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldDecl<'a> {
    pub name: &'a str,
    pub kind: ObjectKind,
    pub shared: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct FactoryHeader<'a> {
    pub variant: Option<VariantId>,
    pub node: NodeId,
    pub name: &'a str,
    pub kind: ObjectKind,
    /// The result is kept in the field of the same name.
    pub stored: bool,
    pub shared: bool,
    /// Long description, else short, for a generated comment.
    pub comment: Option<&'a str>,
}

/// Target-language writer driven by [`generate`].
///
/// Kinds whose construction cannot be expressed generically go through dedicated hooks;
/// the defaults refuse them.
pub trait Emitter {
    fn begin_variant(&mut self, header: &VariantHeader<'_>) -> CompgraphResult<()>;

    fn end_variant(&mut self, header: &VariantHeader<'_>) -> CompgraphResult<()>;

    fn declare_field(&mut self, field: &FieldDecl<'_>) -> CompgraphResult<()>;

    /// Start of a factory. The object exists, and is stored when `header.stored`, before any
    /// of its references are written.
    fn begin_factory(&mut self, header: &FactoryHeader<'_>) -> CompgraphResult<()>;

    fn write_object(&mut self, ctx: &ObjectContext<'_>) -> CompgraphResult<()>;

    fn write_path_data(&mut self, ctx: &ObjectContext<'_>, data: &PathData) -> CompgraphResult<()> {
        let _ = data;
        Err(CompgraphError::unsupported_kind(ctx.kind(), "emitter path hook"))
    }

    fn write_effect(&mut self, ctx: &ObjectContext<'_>) -> CompgraphResult<()> {
        Err(CompgraphError::unsupported_kind(ctx.kind(), "emitter effect hook"))
    }

    /// Construction expression of an inlined node. Called once per inlined node.
    fn inline_expression(&mut self, ctx: &ObjectContext<'_>) -> CompgraphResult<String>;

    fn end_factory(&mut self, header: &FactoryHeader<'_>) -> CompgraphResult<()>;
}

fn comment_of(obj: &SceneObject) -> Option<&str> {
    obj.description
        .long
        .as_deref()
        .or(obj.description.short.as_deref())
}

fn write_body<E: Emitter + ?Sized>(emitter: &mut E, ctx: &ObjectContext<'_>) -> CompgraphResult<()> {
    match &ctx.object.body {
        ObjectBody::PathData(data) => emitter.write_path_data(ctx, data),
        ObjectBody::GaussianBlurEffect(_) | ObjectBody::CompositeEffect(_) => {
            emitter.write_effect(ctx)
        }
        _ => emitter.write_object(ctx),
    }
}

struct Resolver<'p, 'a, E: ?Sized> {
    plan: &'p VariantPlan<'a>,
    emitter: &'p mut E,
}

impl<'p, 'a, E: Emitter + ?Sized> Resolver<'p, 'a, E> {
    fn name_of(&self, id: NodeId) -> CompgraphResult<&'p str> {
        let plan = self.plan;
        plan.annotation(id)
            .name()
            .ok_or_else(|| CompgraphError::invariant("named-factory", id, "factory node has no name"))
    }

    /// Context of `node` as configured inside `host`'s factory.
    ///
    /// `first_use` is false when a transient helper is configured again at a later use; its
    /// edges then belong to an earlier use and every target is read from storage.
    fn context(
        &mut self,
        host: NodeId,
        node: NodeId,
        first_use: bool,
    ) -> CompgraphResult<ObjectContext<'p>> {
        let plan = self.plan;
        let graph = plan.graph();
        let object = plan.scene().object(graph.node(node).identity())?;
        let mut refs = Vec::new();
        for edge in graph.node(node).out_edges() {
            if edge.role == Role::OwnerLookup {
                continue;
            }
            let (via, config) = self.resolve(host, node, edge, first_use)?;
            refs.push(ResolvedRef {
                role: edge.role.clone(),
                target: edge.target,
                via,
                config: config.map(Box::new),
            });
        }
        Ok(ObjectContext {
            variant: Some(plan.id()),
            node,
            object,
            annotation: plan.annotation(node),
            refs,
        })
    }

    /// Path from `host` to `node` when `node` is `host` or part of something being built there.
    fn self_ref(&self, host: NodeId, node: NodeId) -> CompgraphResult<FactoryRef> {
        if node == host {
            return Ok(FactoryRef::This);
        }
        let plan = self.plan;
        match &plan.annotation(node).call_site {
            CallSite::Helper => Ok(FactoryRef::Helper { node }),
            CallSite::Implicit { owner } => {
                let owner_ref = self.self_ref(host, *owner)?;
                self.owned_ref(node, owner_ref)
            }
            _ => Err(CompgraphError::invariant(
                "self-ref",
                node,
                "object is not under construction in this factory",
            )),
        }
    }

    fn owned_ref(&self, node: NodeId, owner: FactoryRef) -> CompgraphResult<FactoryRef> {
        let plan = self.plan;
        let identity = plan.graph().node(node).identity();
        match &plan.scene().object(identity)?.body {
            ObjectBody::PropertySet(_) => Ok(FactoryRef::OwnerProperties {
                owner: Box::new(owner),
            }),
            ObjectBody::AnimationController(c) => Ok(FactoryRef::Controller {
                target: Box::new(owner),
                property: c.property.clone(),
            }),
            other => Err(CompgraphError::unsupported_kind(other.kind(), "owned sub-object")),
        }
    }

    /// Call or read of a factory node from `caller`, through the edge at `position`.
    fn factory_ref(
        &self,
        host: NodeId,
        caller: NodeId,
        target: NodeId,
        position: Option<Position>,
    ) -> CompgraphResult<FactoryRef> {
        if target == host {
            return Ok(FactoryRef::This);
        }
        let plan = self.plan;
        let name = self.name_of(target)?;
        let kind = match position {
            Some(p) => {
                let first_between = plan
                    .graph()
                    .first_edge_between(caller, target)
                    .map(|e| e.position);
                match plan.call_kind(caller, target)? {
                    CallKind::InvokeFactory if first_between == Some(p) => CallKind::InvokeFactory,
                    _ => CallKind::ReadStorage,
                }
            }
            None => CallKind::ReadStorage,
        };
        match kind {
            CallKind::InvokeFactory => Ok(FactoryRef::Call {
                name: name.to_string(),
            }),
            CallKind::ReadStorage if plan.annotation(target).requires_storage => {
                Ok(FactoryRef::Read {
                    field: name.to_string(),
                })
            }
            CallKind::ReadStorage => Err(CompgraphError::invariant(
                "stored-read",
                (caller, target),
                "read of a node that is never stored",
            )),
        }
    }

    fn resolve(
        &mut self,
        host: NodeId,
        caller: NodeId,
        edge: &Edge,
        first_use: bool,
    ) -> CompgraphResult<(FactoryRef, Option<ObjectContext<'p>>)> {
        let plan = self.plan;
        let target = edge.target;
        let position = first_use.then_some(edge.position);

        match &plan.annotation(target).call_site {
            CallSite::Factory { .. } => Ok((self.factory_ref(host, caller, target, position)?, None)),
            CallSite::Implicit { owner } if *owner == caller => {
                let owner_ref = self.self_ref(host, caller)?;
                let via = self.owned_ref(target, owner_ref)?;
                let config = if first_use {
                    Some(self.context(host, target, true)?)
                } else {
                    None
                };
                Ok((via, config))
            }
            CallSite::Implicit { owner } => {
                let owner = *owner;
                // The owner is reached through the lookup edge registered just before this one.
                let lookup = position.and_then(|p| {
                    plan.graph()
                        .node(caller)
                        .out_edges()
                        .iter()
                        .filter(|e| e.role == Role::OwnerLookup && e.target == owner && e.position < p)
                        .map(|e| e.position)
                        .last()
                });
                let owner_ref = match plan.annotation(owner).call_site {
                    CallSite::Factory { .. } => self.factory_ref(host, caller, owner, lookup)?,
                    _ => self.self_ref(host, owner)?,
                };
                Ok((self.owned_ref(target, owner_ref)?, None))
            }
            CallSite::Helper => {
                let first = position.is_some_and(|p| {
                    plan.graph()
                        .first_in_edge(target)
                        .is_some_and(|e| e.position == p)
                });
                let config = self.context(host, target, first)?;
                Ok((FactoryRef::Helper { node: target }, Some(config)))
            }
            CallSite::Inline(thunk) => {
                if position.is_none() {
                    return Err(CompgraphError::invariant(
                        "inline-once",
                        target,
                        "inlined node reached from a repeated use",
                    ));
                }
                let text = thunk.text_or_try_init(|| {
                    let ctx = self.context(target, target, true)?;
                    self.emitter.inline_expression(&ctx)
                })?;
                Ok((
                    FactoryRef::Inline {
                        text: text.to_string(),
                    },
                    None,
                ))
            }
        }
    }

    fn emit_factory(&mut self, id: NodeId) -> CompgraphResult<()> {
        let plan = self.plan;
        let node = plan.graph().node(id);
        let object = plan.scene().object(node.identity())?;
        let annotation = plan.annotation(id);
        let header = FactoryHeader {
            variant: Some(plan.id()),
            node: id,
            name: self.name_of(id)?,
            kind: node.kind(),
            stored: annotation.requires_storage,
            shared: false,
            comment: comment_of(object),
        };
        self.emitter.begin_factory(&header)?;
        let ctx = self.context(id, id, true)?;
        write_body(&mut *self.emitter, &ctx)?;
        self.emitter.end_factory(&header)
    }
}

fn emit_shared<E: Emitter + ?Sized>(plan: &CodegenPlan<'_>, emitter: &mut E) -> CompgraphResult<()> {
    for shared in &plan.shared {
        let Some(&(variant, id)) = shared.users.first() else {
            continue;
        };
        let v = plan.variant(variant);
        let node = v.graph().node(id);
        if !node.out_edges().is_empty() {
            return Err(CompgraphError::invariant(
                "shared-leaf",
                id,
                "shared assets cannot reference variant objects",
            ));
        }
        let object = v.scene().object(node.identity())?;
        emitter.declare_field(&FieldDecl {
            name: &shared.name,
            kind: shared.kind,
            shared: true,
        })?;
        let header = FactoryHeader {
            variant: None,
            node: id,
            name: &shared.name,
            kind: shared.kind,
            stored: true,
            shared: true,
            comment: comment_of(object),
        };
        emitter.begin_factory(&header)?;
        let ctx = ObjectContext {
            variant: None,
            node: id,
            object,
            annotation: v.annotation(id),
            refs: Vec::new(),
        };
        write_body(emitter, &ctx)?;
        emitter.end_factory(&header)?;
    }
    Ok(())
}

/// Drive `emitter` over `plan`.
///
/// Shared assets are declared and created once for the whole plan. Each variant then
/// declares its stored fields and emits its factories in name order, every reference already
/// resolved to a call or a storage read.
#[tracing::instrument(skip(plan, emitter))]
pub fn generate<E: Emitter + ?Sized>(plan: &CodegenPlan<'_>, emitter: &mut E) -> CompgraphResult<()> {
    emit_shared(plan, emitter)?;

    for v in &plan.variants {
        let header = VariantHeader {
            id: v.id(),
            name: v.name(),
            root_factory: v.root_factory()?,
        };
        emitter.begin_variant(&header)?;
        for id in v.stored() {
            let node = v.graph().node(id);
            let name = v.annotation(id).name().ok_or_else(|| {
                CompgraphError::invariant("named-factory", id, "stored node has no name")
            })?;
            emitter.declare_field(&FieldDecl {
                name,
                kind: node.kind(),
                shared: false,
            })?;
        }

        let factories = v.factories();
        let mut resolver = Resolver {
            plan: v,
            emitter: &mut *emitter,
        };
        for id in &factories {
            resolver.emit_factory(*id)?;
        }
        emitter.end_variant(&header)?;
        tracing::debug!(
            variant = v.name(),
            factories = factories.len(),
            orderings = v.orderings_computed(),
            "variant emitted"
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/plan/emit.rs"]
mod tests;
