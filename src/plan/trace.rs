//! Recording emitter and runtime replay.
//!
//! [`TraceEmitter`] keeps, per factory, the calls and storage reads its body performs in
//! order. [`Trace::replay`] then runs every variant from its root factory the way generated
//! code would and fails on a second construction, on a read of an object that does not exist
//! yet or was never stored, and on factories that nothing ever runs.

use std::collections::{HashMap, HashSet};

use crate::foundation::error::{CompgraphError, CompgraphResult};
use crate::foundation::ids::VariantId;
use crate::plan::emit::{
    Emitter, FactoryHeader, FactoryRef, FieldDecl, ObjectContext, VariantHeader,
};
use crate::scene::model::PathData;

/// Runtime effect of one reference.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Step {
    Call(String),
    Read(String),
}

/// Body of one emitted factory.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct TracedFactory {
    pub stored: bool,
    pub steps: Vec<Step>,
}

type Key = (Option<VariantId>, String);

#[derive(Debug, Default)]
pub struct TraceEmitter {
    variant: Option<VariantId>,
    current: Option<(Key, TracedFactory)>,
    trace: Trace,
    inline: HashMap<String, Vec<Step>>,
}

/// Everything a [`TraceEmitter`] saw.
#[derive(Debug, Default)]
pub struct Trace {
    factories: HashMap<Key, TracedFactory>,
    fields: HashSet<Key>,
    variants: Vec<(VariantId, String)>,
    /// Factory bodies written through the path hook.
    pub path_hooks: usize,
    /// Factory bodies written through the effect hook.
    pub effect_hooks: usize,
    /// Inline expressions requested.
    pub inline_requests: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReplayStats {
    pub constructed: usize,
    pub reads: usize,
}

impl TraceEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Trace {
        self.trace
    }

    fn push_via(&self, via: &FactoryRef, out: &mut Vec<Step>) {
        match via {
            FactoryRef::Call { name } => out.push(Step::Call(name.clone())),
            FactoryRef::Read { field } => out.push(Step::Read(field.clone())),
            FactoryRef::Inline { text } => {
                if let Some(steps) = self.inline.get(text) {
                    out.extend(steps.iter().cloned());
                }
            }
            FactoryRef::OwnerProperties { owner } => self.push_via(owner, out),
            FactoryRef::Controller { target, .. } => self.push_via(target, out),
            FactoryRef::This | FactoryRef::Helper { .. } => {}
        }
    }

    fn steps(&self, ctx: &ObjectContext<'_>, out: &mut Vec<Step>) {
        for r in &ctx.refs {
            self.push_via(&r.via, out);
            if let Some(config) = &r.config {
                self.steps(config, out);
            }
        }
    }

    fn record_body(&mut self, ctx: &ObjectContext<'_>) -> CompgraphResult<()> {
        let mut steps = Vec::new();
        self.steps(ctx, &mut steps);
        let (_, factory) = self.current.as_mut().ok_or_else(|| {
            CompgraphError::invariant("factory-scope", ctx.node, "object written outside a factory")
        })?;
        factory.steps = steps;
        Ok(())
    }
}

impl Emitter for TraceEmitter {
    fn begin_variant(&mut self, header: &VariantHeader<'_>) -> CompgraphResult<()> {
        self.variant = Some(header.id);
        self.trace
            .variants
            .push((header.id, header.root_factory.to_string()));
        Ok(())
    }

    fn end_variant(&mut self, _header: &VariantHeader<'_>) -> CompgraphResult<()> {
        self.variant = None;
        Ok(())
    }

    fn declare_field(&mut self, field: &FieldDecl<'_>) -> CompgraphResult<()> {
        let scope = if field.shared { None } else { self.variant };
        if !self.trace.fields.insert((scope, field.name.to_string())) {
            return Err(CompgraphError::invariant(
                "field-once",
                field.name,
                "field declared twice",
            ));
        }
        Ok(())
    }

    fn begin_factory(&mut self, header: &FactoryHeader<'_>) -> CompgraphResult<()> {
        let key = (header.variant, header.name.to_string());
        if self.current.is_some() || self.trace.factories.contains_key(&key) {
            return Err(CompgraphError::invariant(
                "factory-once",
                header.name,
                "factory emitted twice or nested",
            ));
        }
        self.current = Some((
            key,
            TracedFactory {
                stored: header.stored,
                steps: Vec::new(),
            },
        ));
        Ok(())
    }

    fn write_object(&mut self, ctx: &ObjectContext<'_>) -> CompgraphResult<()> {
        self.record_body(ctx)
    }

    fn write_path_data(&mut self, ctx: &ObjectContext<'_>, _data: &PathData) -> CompgraphResult<()> {
        self.trace.path_hooks += 1;
        self.record_body(ctx)
    }

    fn write_effect(&mut self, ctx: &ObjectContext<'_>) -> CompgraphResult<()> {
        self.trace.effect_hooks += 1;
        self.record_body(ctx)
    }

    fn inline_expression(&mut self, ctx: &ObjectContext<'_>) -> CompgraphResult<String> {
        let mut steps = Vec::new();
        self.steps(ctx, &mut steps);
        let text = format!("inline#{}", self.trace.inline_requests);
        self.trace.inline_requests += 1;
        self.inline.insert(text.clone(), steps);
        Ok(text)
    }

    fn end_factory(&mut self, header: &FactoryHeader<'_>) -> CompgraphResult<()> {
        let (key, factory) = self.current.take().ok_or_else(|| {
            CompgraphError::invariant("factory-scope", header.name, "factory ended twice")
        })?;
        self.trace.factories.insert(key, factory);
        Ok(())
    }
}

impl Trace {
    /// Names of the emitted factories of `variant` (`None` for shared assets).
    pub fn factory_names(&self, variant: Option<VariantId>) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .factories
            .keys()
            .filter(|(v, _)| *v == variant)
            .map(|(_, n)| n.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn factory(&self, variant: Option<VariantId>, name: &str) -> Option<&TracedFactory> {
        self.factories.get(&(variant, name.to_string()))
    }

    fn resolve(&self, variant: VariantId, name: &str) -> CompgraphResult<Key> {
        let local = (Some(variant), name.to_string());
        if self.factories.contains_key(&local) {
            return Ok(local);
        }
        let shared = (None, name.to_string());
        if self.factories.contains_key(&shared) {
            return Ok(shared);
        }
        Err(CompgraphError::invariant(
            "known-factory",
            name,
            "reference to a factory that was never emitted",
        ))
    }

    /// Execute every variant from its root factory and check construction order.
    pub fn replay(&self) -> CompgraphResult<ReplayStats> {
        let mut stats = ReplayStats::default();
        let mut shared_created: HashSet<Key> = HashSet::new();
        for (key, factory) in &self.factories {
            if key.0.is_none() {
                if !factory.steps.is_empty() {
                    return Err(CompgraphError::invariant(
                        "shared-leaf",
                        &key.1,
                        "shared factory references other objects",
                    ));
                }
                shared_created.insert(key.clone());
                stats.constructed += 1;
            }
        }

        for (variant, root) in &self.variants {
            let mut created = shared_created.clone();
            let root = self.resolve(*variant, root)?;
            let mut stack: Vec<(Key, usize)> = Vec::new();
            self.construct(&root, &mut created, &mut stats)?;
            stack.push((root, 0));

            while let Some((key, next)) = stack.pop() {
                let Some(factory) = self.factories.get(&key) else {
                    continue;
                };
                let Some(step) = factory.steps.get(next) else {
                    continue;
                };
                stack.push((key, next + 1));
                match step {
                    Step::Call(name) => {
                        let callee = self.resolve(*variant, name)?;
                        self.construct(&callee, &mut created, &mut stats)?;
                        stack.push((callee, 0));
                    }
                    Step::Read(name) => {
                        let callee = self.resolve(*variant, name)?;
                        let stored = self.factories.get(&callee).is_some_and(|f| f.stored)
                            && self.fields.contains(&callee);
                        if !created.contains(&callee) || !stored {
                            return Err(CompgraphError::invariant(
                                "use-before-create",
                                name,
                                "read of an object that is not constructed and stored",
                            ));
                        }
                        stats.reads += 1;
                    }
                }
            }

            for key in self.factories.keys() {
                if key.0 == Some(*variant) && !created.contains(key) {
                    return Err(CompgraphError::invariant(
                        "factory-reached",
                        &key.1,
                        "factory is never run",
                    ));
                }
            }
        }
        Ok(stats)
    }

    fn construct(
        &self,
        key: &Key,
        created: &mut HashSet<Key>,
        stats: &mut ReplayStats,
    ) -> CompgraphResult<()> {
        if !created.insert(key.clone()) {
            return Err(CompgraphError::invariant(
                "factory-once",
                &key.1,
                "factory runs a second time",
            ));
        }
        stats.constructed += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/trace.rs"]
mod tests;
