use std::collections::HashMap;

use smallvec::SmallVec;

use crate::foundation::error::CompgraphResult;
use crate::graph::node::ObjectGraph;
use crate::scene::arena::Scene;
use crate::scene::model::{ObjectRef, Role};

/// Which container rewrites the tree reducer may apply.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReducerOpts {
    /// Replace a pass-through container by its single child.
    pub elide_parent: bool,
    /// Pull the children of a pass-through single child container into its parent.
    pub absorb_child: bool,
}

impl Default for ReducerOpts {
    fn default() -> Self {
        Self {
            elide_parent: true,
            absorb_child: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReduceStats {
    /// Containers replaced by their single child.
    pub elided: usize,
    /// Single child containers whose children moved up into the parent.
    pub absorbed: usize,
}

#[derive(Debug)]
pub struct Reduced {
    pub root: ObjectRef,
    pub stats: ReduceStats,
}

fn is_tree_membership(role: &Role) -> bool {
    matches!(role, Role::Item("Children") | Role::Item("Shapes"))
}

struct Reducer<'s> {
    scene: &'s mut Scene,
    opts: &'s ReducerOpts,
    /// Current referrers of each identity (tree and non-tree), kept up to date by rewrites.
    parents: HashMap<ObjectRef, SmallVec<[ObjectRef; 2]>>,
    /// Identities referenced other than as a container member.
    external: HashMap<ObjectRef, bool>,
    redirect: HashMap<ObjectRef, ObjectRef>,
    stats: ReduceStats,
}

impl Reducer<'_> {
    fn resolve(&self, mut r: ObjectRef) -> ObjectRef {
        while let Some(&next) = self.redirect.get(&r) {
            r = next;
        }
        r
    }

    fn single_parent_is(&self, r: ObjectRef, parent: ObjectRef) -> bool {
        self.parents
            .get(&r)
            .is_some_and(|p| p.len() == 1 && p[0] == parent)
    }

    /// A container that only groups: no animators, no owned properties, default properties.
    fn is_pass_through(&self, r: ObjectRef) -> CompgraphResult<bool> {
        let obj = self.scene.object(r)?;
        Ok(obj.kind().is_container()
            && obj.animators.is_empty()
            && self.scene.properties_of(r).is_none()
            && obj.body.has_default_container_props()
            && !self.external.get(&r).copied().unwrap_or(false))
    }

    fn single_child(&self, c: ObjectRef) -> CompgraphResult<Option<ObjectRef>> {
        let children = self.scene.object(c)?.body.container_children();
        Ok(match children {
            Some([only]) => Some(self.resolve(*only)),
            _ => None,
        })
    }

    fn reparent(&mut self, r: ObjectRef, from: ObjectRef, to: ObjectRef) {
        if let Some(list) = self.parents.get_mut(&r) {
            for p in list.iter_mut() {
                if *p == from {
                    *p = to;
                }
            }
        }
    }

    fn try_absorb(&mut self, c: ObjectRef) -> CompgraphResult<()> {
        let Some(x) = self.single_child(c)? else {
            return Ok(());
        };
        let same_kind = self.scene.object(x)?.kind() == self.scene.object(c)?.kind();
        if !same_kind || !self.is_pass_through(x)? || !self.single_parent_is(x, c) {
            return Ok(());
        }
        let grandchildren: Vec<ObjectRef> = self
            .scene
            .object(x)?
            .body
            .container_children()
            .unwrap_or_default()
            .iter()
            .map(|g| self.resolve(*g))
            .collect();
        for g in &grandchildren {
            self.reparent(*g, x, c);
        }
        if let Some(children) = self.scene.object_mut(c)?.body.container_children_mut() {
            *children = grandchildren;
        }
        self.stats.absorbed += 1;
        Ok(())
    }

    fn try_elide(&mut self, c: ObjectRef, is_root: bool) -> CompgraphResult<()> {
        if !self.is_pass_through(c)? {
            return Ok(());
        }
        let parent = match self.parents.get(&c).map(|p| p.as_slice()) {
            Some([p]) => Some(*p),
            None | Some([]) if is_root => None,
            _ => return Ok(()),
        };
        let Some(x) = self.single_child(c)? else {
            return Ok(());
        };
        if !self.single_parent_is(x, c) {
            return Ok(());
        }
        match parent {
            Some(p) => self.reparent(x, c, p),
            None => {
                self.parents.remove(&x);
            }
        }
        self.redirect.insert(c, x);
        self.stats.elided += 1;
        Ok(())
    }

    /// Point every reference to an eliminated container at its survivor.
    fn sweep(&mut self, live: &[ObjectRef]) -> CompgraphResult<()> {
        for &r in live {
            let needs_rewrite = self
                .scene
                .get(r)
                .is_some_and(|o| o.refs().iter().any(|(_, c)| self.redirect.contains_key(c)));
            if !needs_rewrite {
                continue;
            }
            let redirect = &self.redirect;
            let obj = self.scene.object_mut(r)?;
            obj.try_map_refs(&mut |_, c| {
                let mut c = c;
                while let Some(&next) = redirect.get(&c) {
                    c = next;
                }
                Ok(c)
            })?;
        }
        Ok(())
    }
}

/// Collapse pass-through containers of the tree rooted at `root`, bottom-up, in one pass.
///
/// A rewrite never fires on a container or child with more than one referrer, with
/// animators, with an owned property set, with non-default properties, or that is referenced
/// other than as a container member.
#[tracing::instrument(skip(scene))]
pub fn reduce(scene: &mut Scene, root: ObjectRef, opts: &ReducerOpts) -> CompgraphResult<Reduced> {
    let graph = ObjectGraph::build(scene, root)?;
    let mut parents = HashMap::new();
    let mut external = HashMap::new();
    for (id, node) in graph.nodes() {
        let list: SmallVec<[ObjectRef; 2]> = graph
            .parents(id)
            .iter()
            .map(|p| graph.node(*p).identity())
            .collect();
        parents.insert(node.identity(), list);
        let ext = node.in_edges().iter().any(|e| !is_tree_membership(&e.role));
        external.insert(node.identity(), ext);
    }
    let order: Vec<ObjectRef> = graph.nodes().map(|(_, n)| n.identity()).collect();

    let mut reducer = Reducer {
        scene,
        opts,
        parents,
        external,
        redirect: HashMap::new(),
        stats: ReduceStats::default(),
    };
    for &c in order.iter().rev() {
        if !reducer.scene.object(c)?.kind().is_container() {
            continue;
        }
        if reducer.opts.absorb_child {
            reducer.try_absorb(c)?;
        }
        if reducer.opts.elide_parent {
            reducer.try_elide(c, c == root)?;
        }
    }
    reducer.sweep(&order)?;

    let new_root = reducer.resolve(root);
    tracing::debug!(
        elided = reducer.stats.elided,
        absorbed = reducer.stats.absorbed,
        "tree reduced"
    );
    Ok(Reduced {
        root: new_root,
        stats: reducer.stats,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/optimize/reducer.rs"]
mod tests;
