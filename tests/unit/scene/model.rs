use super::*;

fn r(index: u32) -> ObjectRef {
    ObjectRef {
        scene: SceneId(7),
        index,
    }
}

#[test]
fn kind_names_round_trip() {
    for &k in ObjectKind::ALL {
        assert_eq!(ObjectKind::from_name(k.name()), Some(k));
    }
    assert_eq!(ObjectKind::from_name("Hologram"), None);
}

#[test]
fn tree_kinds_are_visuals_and_shapes() {
    assert!(ObjectKind::ContainerShape.is_tree_kind());
    assert!(ObjectKind::SpriteVisual.is_tree_kind());
    assert!(!ObjectKind::ColorBrush.is_tree_kind());
    assert!(!ObjectKind::PropertySet.is_tree_kind());
}

#[test]
fn sprite_shape_refs_keep_slot_roles_in_field_order() {
    let body = ObjectBody::SpriteShape(SpriteShape {
        geometry: Some(r(1)),
        fill_brush: Some(r(2)),
        stroke_brush: Some(r(2)),
        ..SpriteShape::default()
    });
    let mut seen = Vec::new();
    body.for_each_ref(|role, r| seen.push((role, r.index)));
    assert_eq!(
        seen,
        vec![
            (Role::Slot("Geometry"), 1),
            (Role::Slot("FillBrush"), 2),
            (Role::Slot("StrokeBrush"), 2),
        ]
    );
}

#[test]
fn map_refs_visits_same_order_as_for_each_ref() {
    let mut body = ObjectBody::KeyFrameAnimation(KeyFrameAnimation {
        value_type: KeyFrameType::Path,
        duration: Ticks::from_millis(1000),
        key_frames: vec![
            KeyFrame {
                progress: 0.0,
                value: KeyFrameValue::Path(r(3)),
                easing: None,
            },
            KeyFrame {
                progress: 1.0,
                value: KeyFrameValue::Path(r(4)),
                easing: Some(r(5)),
            },
        ],
        reference_parameters: vec![("root".to_string(), r(6))],
    });

    let mut visited = Vec::new();
    body.for_each_ref(|role, r| visited.push((role, r.index)));

    let mut mapped = Vec::new();
    body.try_map_refs(&mut |role: &Role, x: ObjectRef| {
        mapped.push((role.clone(), x.index));
        Ok(r(x.index + 100))
    })
    .unwrap();
    assert_eq!(visited, mapped);

    let mut after = Vec::new();
    body.for_each_ref(|_, r| after.push(r.index));
    assert_eq!(after, vec![103, 104, 105, 106]);
}

#[test]
fn back_references_are_not_visited() {
    let ps = ObjectBody::PropertySet(PropertySet {
        owner: Some(r(1)),
        values: Default::default(),
    });
    let ctl = ObjectBody::AnimationController(AnimationController {
        target: r(1),
        property: "Progress".to_string(),
        paused: true,
    });
    let mut n = 0;
    ps.for_each_ref(|_, _| n += 1);
    ctl.for_each_ref(|_, _| n += 1);
    assert_eq!(n, 0);
    assert_eq!(ps.owner(), Some(r(1)));
    assert_eq!(ctl.owner(), Some(r(1)));
}

#[test]
fn scene_object_refs_append_animators_after_body() {
    let mut obj = SceneObject::new(ObjectBody::ContainerShape(ContainerShape {
        shapes: vec![r(1)],
        ..ContainerShape::default()
    }));
    obj.animators.push(Animator {
        property: "Offset".to_string(),
        animation: r(2),
        controller: Some(r(3)),
    });
    let refs = obj.refs();
    assert_eq!(refs[0], (Role::Item("Shapes"), r(1)));
    assert_eq!(refs[1], (Role::Animation("Offset".to_string()), r(2)));
    assert_eq!(refs[2], (Role::Controller("Offset".to_string()), r(3)));
}

#[test]
fn keyframe_validation_rejects_mismatched_values() {
    let anim = KeyFrameAnimation {
        value_type: KeyFrameType::Scalar,
        duration: Ticks::from_millis(100),
        key_frames: vec![KeyFrame {
            progress: 0.0,
            value: KeyFrameValue::Color(crate::foundation::core::Color::rgb(1, 2, 3)),
            easing: None,
        }],
        reference_parameters: vec![],
    };
    assert!(anim.validate().is_err());
}

#[test]
fn keyframe_validation_rejects_unordered_progress() {
    let kf = |p: f64| KeyFrame {
        progress: p,
        value: KeyFrameValue::Scalar(p),
        easing: None,
    };
    let anim = KeyFrameAnimation {
        value_type: KeyFrameType::Scalar,
        duration: Ticks::from_millis(100),
        key_frames: vec![kf(0.5), kf(0.25)],
        reference_parameters: vec![],
    };
    assert!(anim.validate().is_err());
}

#[test]
fn expression_key_frames_fit_any_type() {
    let anim = KeyFrameAnimation {
        value_type: KeyFrameType::Vector2,
        duration: Ticks::from_millis(100),
        key_frames: vec![KeyFrame {
            progress: 0.0,
            value: KeyFrameValue::Expression("this.StartingValue".to_string()),
            easing: None,
        }],
        reference_parameters: vec![],
    };
    anim.validate().unwrap();
}

#[test]
fn default_container_props_detection() {
    let plain = ObjectBody::ContainerVisual(ContainerVisual::default());
    assert!(plain.has_default_container_props());
    let moved = ObjectBody::ContainerVisual(ContainerVisual {
        props: VisualProps {
            opacity: Some(0.5),
            ..VisualProps::default()
        },
        children: vec![],
    });
    assert!(!moved.has_default_container_props());
    assert!(!ObjectBody::LinearEasing.has_default_container_props());
}
