use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::foundation::error::{CompgraphError, CompgraphResult};
use crate::foundation::ids::NodeId;
use crate::graph::node::ObjectGraph;

/// How a caller obtains a callee that has a factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum CallKind {
    /// The caller is the first user: it runs the callee's factory.
    InvokeFactory,
    /// The callee already exists: the caller reads it from storage.
    ReadStorage,
}

/// Per-variant memo of factory call decisions, keyed by `(caller, callee)`.
#[derive(Debug, Default)]
pub struct CallOrdering {
    memo: RefCell<HashMap<(NodeId, NodeId), CallKind>>,
    computed: Cell<usize>,
}

impl CallOrdering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `caller` invokes `callee`'s factory or reads it from storage.
    ///
    /// The caller invokes the factory only when its first edge to the callee is the globally
    /// first edge into the callee; the root and shared assets exist before any edge and are
    /// always read. A caller with no edge to the callee is an invariant fault.
    pub fn call_kind(
        &self,
        graph: &ObjectGraph,
        caller: NodeId,
        callee: NodeId,
        callee_shared: bool,
    ) -> CompgraphResult<CallKind> {
        if let Some(&kind) = self.memo.borrow().get(&(caller, callee)) {
            return Ok(kind);
        }

        let edge = graph.first_edge_between(caller, callee).ok_or_else(|| {
            CompgraphError::invariant(
                "call-ordering",
                (caller, callee),
                "ordering requested for a pair with no edge",
            )
        })?;
        let first = graph.first_in_edge(callee).ok_or_else(|| {
            CompgraphError::invariant("call-ordering", callee, "callee has no incoming edge")
        })?;

        let kind = if edge.position == first.position && callee != graph.root() && !callee_shared
        {
            CallKind::InvokeFactory
        } else {
            CallKind::ReadStorage
        };
        self.computed.set(self.computed.get() + 1);
        self.memo.borrow_mut().insert((caller, callee), kind);
        Ok(kind)
    }

    /// Number of distinct pairs decided so far.
    pub fn computed(&self) -> usize {
        self.computed.get()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/ordering.rs"]
mod tests;
