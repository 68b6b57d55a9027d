//! Local (reference-free) signatures of scene objects.
//!
//! A local signature captures everything that makes two objects different *except* their
//! outgoing references: kind, scalar/vector/enum fields, animator property names and, unless
//! ignored, descriptive labels. References are replaced by a placeholder and compared
//! separately by the canonicalizer through the classes of their targets.

use crate::foundation::error::{CompgraphError, CompgraphResult};
use crate::foundation::hash::{Fingerprint, StableHasher};
use crate::scene::model::{LoadedImageSurface, ObjectBody, ObjectRef, SceneId, SceneObject};

const PLACEHOLDER: ObjectRef = ObjectRef {
    scene: SceneId::UNBOUND,
    index: 0,
};

const TAG_BODY: u8 = 0x01;
const TAG_IMAGE: u8 = 0x02;
const TAG_ANIMATORS: u8 = 0x03;
const TAG_DESCRIPTION: u8 = 0x04;

/// Exact byte encoding of the non-reference content of `obj`.
///
/// Fields are encoded through their serde form (floats in shortest round-trip notation),
/// except image bytes, which contribute their xxh3-128 digest and length.
pub(crate) fn local_signature(
    obj: &SceneObject,
    ignore_descriptive_fields: bool,
) -> CompgraphResult<Vec<u8>> {
    let mut out = Vec::with_capacity(64);

    let mut body = match &obj.body {
        ObjectBody::LoadedImageSurface(s) => {
            let digest = Fingerprint::of_bytes(&s.data);
            out.push(TAG_IMAGE);
            out.extend_from_slice(&digest.hi.to_le_bytes());
            out.extend_from_slice(&digest.lo.to_le_bytes());
            out.extend_from_slice(&(s.data.len() as u64).to_le_bytes());
            ObjectBody::LoadedImageSurface(LoadedImageSurface {
                data: Vec::new(),
                width: s.width,
                height: s.height,
            })
        }
        other => other.clone(),
    };
    body.try_map_refs(&mut |_, _| Ok(PLACEHOLDER))?;
    match &mut body {
        ObjectBody::PropertySet(p) => {
            if let Some(owner) = p.owner.as_mut() {
                *owner = PLACEHOLDER;
            }
        }
        ObjectBody::AnimationController(c) => c.target = PLACEHOLDER,
        _ => {}
    }

    out.push(TAG_BODY);
    let encoded = serde_json::to_vec(&body).map_err(|e| CompgraphError::serde(e.to_string()))?;
    out.extend_from_slice(&(encoded.len() as u64).to_le_bytes());
    out.extend_from_slice(&encoded);

    out.push(TAG_ANIMATORS);
    out.extend_from_slice(&(obj.animators.len() as u32).to_le_bytes());
    for a in &obj.animators {
        push_str(&mut out, &a.property);
        out.push(u8::from(a.controller.is_some()));
    }

    if !ignore_descriptive_fields {
        out.push(TAG_DESCRIPTION);
        push_opt_str(&mut out, obj.description.short.as_deref());
        push_opt_str(&mut out, obj.description.long.as_deref());
    }
    Ok(out)
}

/// Stable content fingerprint of `obj`, ignoring references and descriptions.
///
/// Used to key shared assets across independently planned variants.
pub(crate) fn content_fingerprint(obj: &SceneObject) -> CompgraphResult<Fingerprint> {
    let sig = local_signature(obj, true)?;
    let mut h = StableHasher::new();
    h.write_str(obj.kind().name());
    h.write_u64(sig.len() as u64);
    h.write_bytes(&sig);
    Ok(h.finish())
}

fn push_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn push_opt_str(out: &mut Vec<u8>, s: Option<&str>) {
    match s {
        Some(s) => {
            out.push(1);
            push_str(out, s);
        }
        None => out.push(0),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canon/signature.rs"]
mod tests;
