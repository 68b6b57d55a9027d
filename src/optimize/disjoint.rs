use std::collections::HashSet;

use crate::foundation::error::{CompgraphError, CompgraphResult};
use crate::scene::arena::Scene;
use crate::scene::model::ObjectRef;

/// Every identity mentioned by the objects reachable from `root`.
///
/// References stamped with another scene are collected but not followed, so a leaked
/// reference shows up in the result instead of aborting the walk.
pub(crate) fn mentioned_identities(scene: &Scene, root: ObjectRef) -> HashSet<ObjectRef> {
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(r) = stack.pop() {
        if !seen.insert(r) {
            continue;
        }
        let Some(obj) = scene.get(r) else {
            continue;
        };
        for (_, c) in obj.refs() {
            stack.push(c);
        }
        if let Some(owner) = obj.body.owner() {
            stack.push(owner);
        }
        if let Some(ps) = scene.properties_of(r) {
            stack.push(ps);
        }
    }
    seen
}

/// Fail when the graph reachable from `out_root` shares any identity with the graph reachable
/// from `source_root`.
pub fn check_disjoint(
    source: &Scene,
    source_root: ObjectRef,
    out: &Scene,
    out_root: ObjectRef,
) -> CompgraphResult<()> {
    let before = mentioned_identities(source, source_root);
    let after = mentioned_identities(out, out_root);
    if let Some(shared) = after.intersection(&before).min() {
        return Err(CompgraphError::invariant(
            "disjoint-output",
            *shared,
            format!(
                "output graph of {:?} still references an identity of {:?}",
                out.id(),
                source.id()
            ),
        ));
    }
    if let Some(foreign) = after.iter().filter(|r| r.scene() != out.id()).min() {
        return Err(CompgraphError::invariant(
            "disjoint-output",
            *foreign,
            "output graph references an identity from another scene",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/optimize/disjoint.rs"]
mod tests;
