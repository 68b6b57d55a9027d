use crate::foundation::error::{CompgraphError, CompgraphResult};
use crate::scene::arena::Scene;
use crate::scene::model::{ObjectBody, ObjectKind, ObjectRef, SceneId, SceneObject};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Serde boundary for a scene: objects in slot order, references as slot indices.
///
/// Owned property sets and controllers appear as ordinary entries whose `owner`/`target`
/// index names their owner; loading registers them in the owner's side tables.
pub struct SceneFile {
    /// Index of the root object.
    pub root: ObjectRef,
    /// Objects in slot order.
    pub objects: Vec<SceneObject>,
}

impl SceneFile {
    /// Parse a scene file, rejecting unknown object kinds as unsupported.
    pub fn from_json(s: &str) -> CompgraphResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(s).map_err(|e| CompgraphError::serde(e.to_string()))?;
        if let Some(objects) = value.get("objects").and_then(|v| v.as_array()) {
            for obj in objects {
                if let Some(kind) = obj.get("kind").and_then(|k| k.as_str())
                    && ObjectKind::from_name(kind).is_none()
                    && !is_key_frame_tag(kind)
                {
                    return Err(CompgraphError::unsupported_kind_name(kind, "scene file"));
                }
            }
        }
        serde_json::from_value(value).map_err(|e| CompgraphError::serde(e.to_string()))
    }

    /// Pretty JSON form.
    pub fn to_json(&self) -> CompgraphResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CompgraphError::serde(e.to_string()))
    }
}

// Key frame animations share a single tag; their kind comes from `value_type`.
fn is_key_frame_tag(kind: &str) -> bool {
    kind == "KeyFrameAnimation"
}

fn rebind(scene: SceneId, len: usize, r: ObjectRef) -> CompgraphResult<ObjectRef> {
    if r.index as usize >= len {
        return Err(CompgraphError::validation(format!(
            "reference to object {} but the file holds {len} objects",
            r.index
        )));
    }
    Ok(ObjectRef {
        scene,
        index: r.index,
    })
}

impl Scene {
    /// Build a scene from its file form. Returns the scene and its root.
    pub fn from_file(file: SceneFile) -> CompgraphResult<(Scene, ObjectRef)> {
        let mut scene = Scene::new();
        let id = scene.id();
        let len = file.objects.len();
        for mut obj in file.objects {
            obj.try_map_refs(&mut |_, r| rebind(id, len, r))?;
            match &mut obj.body {
                ObjectBody::PropertySet(p) => {
                    if let Some(owner) = p.owner.as_mut() {
                        *owner = rebind(id, len, *owner)?;
                    }
                }
                ObjectBody::AnimationController(c) => {
                    c.target = rebind(id, len, c.target)?;
                }
                _ => {}
            }
            scene.insert(obj);
        }
        let root = rebind(id, len, file.root)?;
        scene.validate()?;
        Ok((scene, root))
    }

    /// File form of the objects reachable from `root`, renumbered densely in discovery order.
    pub fn to_file(&self, root: ObjectRef) -> CompgraphResult<SceneFile> {
        let order = self.reachable(root)?;
        let index_of: std::collections::HashMap<ObjectRef, u32> = order
            .iter()
            .enumerate()
            .map(|(i, r)| (*r, i as u32))
            .collect();
        let renumber = |r: ObjectRef| -> CompgraphResult<ObjectRef> {
            let index = *index_of.get(&r).ok_or_else(|| {
                CompgraphError::invariant("reachable", r, "reference escapes the reachable set")
            })?;
            Ok(ObjectRef {
                scene: SceneId::UNBOUND,
                index,
            })
        };

        let mut objects = Vec::with_capacity(order.len());
        for r in &order {
            let mut obj = self.object(*r)?.clone();
            obj.try_map_refs(&mut |_, c| renumber(c))?;
            match &mut obj.body {
                ObjectBody::PropertySet(p) => {
                    if let Some(owner) = p.owner.as_mut() {
                        *owner = renumber(*owner)?;
                    }
                }
                ObjectBody::AnimationController(c) => c.target = renumber(c.target)?,
                _ => {}
            }
            objects.push(obj);
        }
        Ok(SceneFile {
            root: renumber(root)?,
            objects,
        })
    }

    /// Parse a JSON scene file.
    pub fn from_json(s: &str) -> CompgraphResult<(Scene, ObjectRef)> {
        Scene::from_file(SceneFile::from_json(s)?)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/file.rs"]
mod tests;
