use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::foundation::error::{CompgraphError, CompgraphResult};
use crate::scene::model::{
    AnimationController, ObjectBody, ObjectRef, PropertySet, SceneId, SceneObject,
};

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Debug)]
struct Slot {
    object: Option<SceneObject>,
    frozen: bool,
}

/// Arena of scene objects.
///
/// Owned property sets and animation controllers are not fields of their owner; they are kept in
/// side tables and obtained the way the target object API obtains them
/// ([`Scene::ensure_properties`], [`Scene::animation_controller`]).
///
/// `Scene` is deliberately not `Clone`: a clone would share the arena stamp and with it every
/// object identity.
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    slots: Vec<Slot>,
    owned_properties: HashMap<ObjectRef, ObjectRef>,
    controllers: HashMap<(ObjectRef, String), ObjectRef>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene with a fresh arena stamp.
    pub fn new() -> Self {
        Self {
            id: SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed)),
            slots: Vec::new(),
            owned_properties: HashMap::new(),
            controllers: HashMap::new(),
        }
    }

    /// Arena stamp of this scene.
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Number of slots (filled or reserved).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` when the scene holds no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn next_ref(&self) -> ObjectRef {
        ObjectRef {
            scene: self.id,
            index: u32::try_from(self.slots.len()).unwrap_or(u32::MAX),
        }
    }

    /// Insert a filled object.
    ///
    /// An owned property set becomes its owner's property set and a controller becomes the
    /// controller of `(target, property)`. An earlier registration is never replaced; the
    /// second object stays unregistered and [`Scene::validate`] rejects the scene.
    pub fn insert(&mut self, object: SceneObject) -> ObjectRef {
        let r = self.next_ref();
        self.register_owned(r, &object.body);
        self.slots.push(Slot {
            object: Some(object),
            frozen: false,
        });
        r
    }

    /// Shorthand for inserting an unlabeled, unanimated object.
    pub fn add(&mut self, body: ObjectBody) -> ObjectRef {
        self.insert(SceneObject::new(body))
    }

    /// Reserve a slot whose object is provided later through [`Scene::fill`].
    pub fn reserve(&mut self) -> ObjectRef {
        let r = self.next_ref();
        self.slots.push(Slot {
            object: None,
            frozen: false,
        });
        r
    }

    /// Provide the object of a reserved slot. Filling a slot twice is an invariant violation.
    pub fn fill(&mut self, r: ObjectRef, object: SceneObject) -> CompgraphResult<()> {
        self.check_ref(r)?;
        if self.slots[r.index as usize].object.is_some() {
            return Err(CompgraphError::invariant(
                "fill-once",
                r,
                "slot is already filled",
            ));
        }
        if !self.register_owned(r, &object.body) {
            return Err(CompgraphError::invariant(
                "owned-once",
                r,
                format!("{} is already registered for its owner", object.kind().name()),
            ));
        }
        self.slots[r.index as usize].object = Some(object);
        Ok(())
    }

    /// Record `r` in its owner's side table. `false` when the slot is already taken.
    fn register_owned(&mut self, r: ObjectRef, body: &ObjectBody) -> bool {
        match body {
            ObjectBody::PropertySet(PropertySet {
                owner: Some(owner), ..
            }) => match self.owned_properties.entry(*owner) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(r);
                    true
                }
            },
            ObjectBody::AnimationController(c) => {
                match self.controllers.entry((c.target, c.property.clone())) {
                    Entry::Occupied(_) => false,
                    Entry::Vacant(slot) => {
                        slot.insert(r);
                        true
                    }
                }
            }
            _ => true,
        }
    }

    /// Fail unless `r` was issued by this scene.
    pub fn check_ref(&self, r: ObjectRef) -> CompgraphResult<()> {
        if r.scene != self.id {
            return Err(CompgraphError::invariant(
                "same-scene",
                r,
                format!("reference belongs to scene {:?}, not {:?}", r.scene, self.id),
            ));
        }
        if r.index as usize >= self.slots.len() {
            return Err(CompgraphError::invariant(
                "same-scene",
                r,
                "reference index is out of range",
            ));
        }
        Ok(())
    }

    /// Filled object behind `r`, if any.
    pub fn get(&self, r: ObjectRef) -> Option<&SceneObject> {
        if r.scene != self.id {
            return None;
        }
        self.slots.get(r.index as usize)?.object.as_ref()
    }

    /// Filled object behind `r`.
    pub fn object(&self, r: ObjectRef) -> CompgraphResult<&SceneObject> {
        self.check_ref(r)?;
        self.slots[r.index as usize]
            .object
            .as_ref()
            .ok_or_else(|| CompgraphError::invariant("filled-slot", r, "slot is reserved but empty"))
    }

    /// Mutable access; frozen objects refuse mutation.
    pub fn object_mut(&mut self, r: ObjectRef) -> CompgraphResult<&mut SceneObject> {
        self.check_ref(r)?;
        let slot = &mut self.slots[r.index as usize];
        if slot.frozen {
            return Err(CompgraphError::invariant(
                "frozen",
                r,
                "attempt to mutate a frozen object",
            ));
        }
        slot.object
            .as_mut()
            .ok_or_else(|| CompgraphError::invariant("filled-slot", r, "slot is reserved but empty"))
    }

    /// Mark an object immutable. A reserved slot may still be filled once.
    pub fn freeze(&mut self, r: ObjectRef) -> CompgraphResult<()> {
        self.check_ref(r)?;
        self.slots[r.index as usize].frozen = true;
        Ok(())
    }

    /// `true` once [`Scene::freeze`] ran for `r`.
    pub fn is_frozen(&self, r: ObjectRef) -> bool {
        r.scene == self.id
            && self
                .slots
                .get(r.index as usize)
                .is_some_and(|slot| slot.frozen)
    }

    /// Property set owned by `owner`, if it was ever requested.
    pub fn properties_of(&self, owner: ObjectRef) -> Option<ObjectRef> {
        self.owned_properties.get(&owner).copied()
    }

    /// Property set owned by `owner`, created on first request.
    pub fn ensure_properties(&mut self, owner: ObjectRef) -> CompgraphResult<ObjectRef> {
        self.check_ref(owner)?;
        if let Some(r) = self.properties_of(owner) {
            return Ok(r);
        }
        Ok(self.add(ObjectBody::PropertySet(PropertySet {
            owner: Some(owner),
            values: Default::default(),
        })))
    }

    /// Controller of the animation on `(target, property)`, if it was ever requested.
    pub fn controller_of(&self, target: ObjectRef, property: &str) -> Option<ObjectRef> {
        self.controllers
            .get(&(target, property.to_string()))
            .copied()
    }

    /// Controller of the animation on `(target, property)`, created on first request.
    pub fn animation_controller(
        &mut self,
        target: ObjectRef,
        property: &str,
    ) -> CompgraphResult<ObjectRef> {
        self.check_ref(target)?;
        if let Some(r) = self.controller_of(target, property) {
            return Ok(r);
        }
        Ok(self.add(ObjectBody::AnimationController(AnimationController {
            target,
            property: property.to_string(),
            paused: false,
        })))
    }

    /// Filled objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectRef, &SceneObject)> + '_ {
        let id = self.id;
        self.slots.iter().enumerate().filter_map(move |(i, slot)| {
            slot.object.as_ref().map(|o| {
                (
                    ObjectRef {
                        scene: id,
                        index: i as u32,
                    },
                    o,
                )
            })
        })
    }

    /// Every identity reachable from `root`: outgoing references, owned property sets,
    /// controllers and the owners of owned sub-objects. Order is depth-first discovery order.
    pub fn reachable(&self, root: ObjectRef) -> CompgraphResult<Vec<ObjectRef>> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(r) = stack.pop() {
            if !seen.insert(r) {
                continue;
            }
            let obj = self.object(r)?;
            order.push(r);
            let mut next: Vec<ObjectRef> = obj.refs().into_iter().map(|(_, c)| c).collect();
            if let Some(owner) = obj.body.owner() {
                next.push(owner);
            }
            if let Some(ps) = self.properties_of(r) {
                next.push(ps);
            }
            stack.extend(next.into_iter().rev());
        }
        Ok(order)
    }

    /// Check that every reference and back-reference stays inside this scene and points at a
    /// filled slot, that every owner has at most one property set and one controller per
    /// property, and that key frame animations are well formed.
    pub fn validate(&self) -> CompgraphResult<()> {
        for (r, obj) in self.iter() {
            for (role, c) in obj.refs() {
                self.object(c).map_err(|_| {
                    CompgraphError::validation(format!(
                        "{r:?} ({}) holds a dangling {role:?} reference {c:?}",
                        obj.kind().name()
                    ))
                })?;
            }
            if let Some(owner) = obj.body.owner() {
                self.object(owner).map_err(|_| {
                    CompgraphError::validation(format!("{r:?} has a dangling owner {owner:?}"))
                })?;
            }
            match &obj.body {
                ObjectBody::PropertySet(PropertySet {
                    owner: Some(owner), ..
                }) if self.properties_of(*owner) != Some(r) => {
                    return Err(CompgraphError::validation(format!(
                        "{r:?} is a second property set of {owner:?}"
                    )));
                }
                ObjectBody::AnimationController(c)
                    if self.controller_of(c.target, &c.property) != Some(r) =>
                {
                    return Err(CompgraphError::validation(format!(
                        "{r:?} is a second controller of {:?}.{}",
                        c.target, c.property
                    )));
                }
                ObjectBody::KeyFrameAnimation(a) => a.validate()?,
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/arena.rs"]
mod tests;
