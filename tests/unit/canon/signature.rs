use super::*;
use crate::foundation::core::Color;
use crate::scene::model::{ColorBrush, SpriteShape};

fn brush(color: Color, label: Option<&str>) -> SceneObject {
    let mut obj = SceneObject::new(ObjectBody::ColorBrush(ColorBrush { color: Some(color) }));
    obj.description.short = label.map(str::to_string);
    obj
}

#[test]
fn labels_only_matter_when_not_ignored() {
    let a = brush(Color::rgb(1, 2, 3), Some("Red"));
    let b = brush(Color::rgb(1, 2, 3), Some("Crimson"));
    assert_ne!(local_signature(&a, false).unwrap(), local_signature(&b, false).unwrap());
    assert_eq!(local_signature(&a, true).unwrap(), local_signature(&b, true).unwrap());
}

#[test]
fn field_changes_change_the_signature() {
    let a = brush(Color::rgb(1, 2, 3), None);
    let b = brush(Color::rgb(1, 2, 4), None);
    assert_ne!(local_signature(&a, true).unwrap(), local_signature(&b, true).unwrap());
}

#[test]
fn references_do_not_contribute() {
    let r = |index| ObjectRef {
        scene: SceneId(3),
        index,
    };
    let a = SceneObject::new(ObjectBody::SpriteShape(SpriteShape {
        geometry: Some(r(1)),
        fill_brush: Some(r(2)),
        ..SpriteShape::default()
    }));
    let b = SceneObject::new(ObjectBody::SpriteShape(SpriteShape {
        geometry: Some(r(7)),
        fill_brush: Some(r(9)),
        ..SpriteShape::default()
    }));
    assert_eq!(local_signature(&a, false).unwrap(), local_signature(&b, false).unwrap());
}

#[test]
fn image_surfaces_compare_by_digest() {
    let png = |bytes: &[u8]| {
        SceneObject::new(ObjectBody::LoadedImageSurface(LoadedImageSurface {
            data: bytes.to_vec(),
            width: 2,
            height: 2,
        }))
    };
    let a = png(b"\x89PNG-one");
    let b = png(b"\x89PNG-one");
    let c = png(b"\x89PNG-two");
    assert_eq!(local_signature(&a, false).unwrap(), local_signature(&b, false).unwrap());
    assert_ne!(local_signature(&a, false).unwrap(), local_signature(&c, false).unwrap());
    assert_eq!(content_fingerprint(&a).unwrap(), content_fingerprint(&b).unwrap());
    assert_ne!(content_fingerprint(&a).unwrap(), content_fingerprint(&c).unwrap());
}
