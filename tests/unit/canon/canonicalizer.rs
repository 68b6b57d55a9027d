use super::*;
use crate::foundation::core::Color;
use crate::scene::model::{ObjectRef, PropertyValue};

fn graph_of(s: &Scene, root: ObjectRef) -> ObjectGraph {
    ObjectGraph::build(s, root).unwrap()
}

fn two_brushes(s: &mut Scene, a: Color, b: Color) -> (ObjectRef, ObjectRef, ObjectRef) {
    let rect = s.rectangle(1.0, 1.0);
    let b1 = s.color_brush(a);
    let b2 = s.color_brush(b);
    let s1 = s.sprite_shape(rect, Some(b1));
    let s2 = s.sprite_shape(rect, Some(b2));
    let root = s.container_shape(vec![s1, s2]);
    (root, b1, b2)
}

#[test]
fn identical_leaves_share_the_first_discovered_representative() {
    let mut s = Scene::new();
    let (root, b1, b2) = two_brushes(&mut s, Color::rgb(9, 9, 9), Color::rgb(9, 9, 9));
    let mut g = graph_of(&s, root);
    let c = canonicalize(&mut g, &s, &CanonicalizeOpts::default()).unwrap();

    let n1 = g.node_of(b1).unwrap();
    let n2 = g.node_of(b2).unwrap();
    assert_eq!(g.canonical(n2), n1);
    assert_eq!(g.canonical(n1), n1);
    assert_eq!(c.class_of(n1), c.class_of(n2));
    assert_eq!(c.merged(), 1);
}

#[test]
fn a_changed_field_prevents_the_merge() {
    let mut s = Scene::new();
    let (root, b1, b2) = two_brushes(&mut s, Color::rgb(9, 9, 9), Color::rgb(9, 9, 8));
    let mut g = graph_of(&s, root);
    let c = canonicalize(&mut g, &s, &CanonicalizeOpts::default()).unwrap();
    assert_ne!(
        g.canonical(g.node_of(b1).unwrap()),
        g.canonical(g.node_of(b2).unwrap())
    );
    assert_eq!(c.merged(), 0);
}

#[test]
fn labels_block_merging_unless_ignored() {
    let mut s = Scene::new();
    let (root, b1, b2) = two_brushes(&mut s, Color::rgb(1, 1, 1), Color::rgb(1, 1, 1));
    s.describe(b1, "Fill", None).unwrap();
    s.describe(b2, "Other fill", Some("comment")).unwrap();

    let mut g = graph_of(&s, root);
    canonicalize(&mut g, &s, &CanonicalizeOpts::default()).unwrap();
    assert!(g.is_canonical(g.node_of(b2).unwrap()));

    let mut g = graph_of(&s, root);
    let opts = CanonicalizeOpts {
        ignore_descriptive_fields: true,
        ..CanonicalizeOpts::default()
    };
    canonicalize(&mut g, &s, &opts).unwrap();
    assert_eq!(g.canonical(g.node_of(b2).unwrap()), g.node_of(b1).unwrap());
}

#[test]
fn canonicalization_is_idempotent() {
    let mut s = Scene::new();
    let (root, _, _) = two_brushes(&mut s, Color::rgb(3, 3, 3), Color::rgb(3, 3, 3));
    let mut g = graph_of(&s, root);
    let first = canonicalize(&mut g, &s, &CanonicalizeOpts::default()).unwrap();
    let reps: Vec<NodeId> = g.ids().map(|id| g.canonical(id)).collect();
    let second = canonicalize(&mut g, &s, &CanonicalizeOpts::default()).unwrap();
    let again: Vec<NodeId> = g.ids().map(|id| g.canonical(id)).collect();
    assert_eq!(reps, again);
    assert_eq!(first.class_count(), second.class_count());
    for id in g.ids() {
        assert_eq!(g.canonical(g.canonical(id)), g.canonical(id));
    }
}

#[test]
fn tree_kinds_merge_only_on_request() {
    let mut s = Scene::new();
    let rect = s.rectangle(1.0, 1.0);
    let a = s.sprite_shape(rect, None);
    let b = s.sprite_shape(rect, None);
    let root = s.container_shape(vec![a, b]);

    let mut g = graph_of(&s, root);
    canonicalize(&mut g, &s, &CanonicalizeOpts::default()).unwrap();
    assert!(g.is_canonical(g.node_of(b).unwrap()));

    let mut g = graph_of(&s, root);
    let opts = CanonicalizeOpts {
        merge_tree_kinds: true,
        ..CanonicalizeOpts::default()
    };
    canonicalize(&mut g, &s, &opts).unwrap();
    assert_eq!(g.canonical(g.node_of(b).unwrap()), g.node_of(a).unwrap());
}

#[test]
fn differences_propagate_up_through_references() {
    let mut s = Scene::new();
    let img1 = s.image_surface(b"\x89PNG-a", 1, 1);
    let img2 = s.image_surface(b"\x89PNG-b", 1, 1);
    let img3 = s.image_surface(b"\x89PNG-a", 1, 1);
    let sb1 = s.surface_brush(img1);
    let sb2 = s.surface_brush(img2);
    let sb3 = s.surface_brush(img3);
    let rect = s.rectangle(1.0, 1.0);
    let shapes = [sb1, sb2, sb3].map(|b| s.sprite_shape(rect, Some(b)));
    let root = s.container_shape(shapes.to_vec());

    let mut g = graph_of(&s, root);
    canonicalize(&mut g, &s, &CanonicalizeOpts::default()).unwrap();
    let n = |r| g.node_of(r).unwrap();
    assert_eq!(g.canonical(n(sb3)), n(sb1));
    assert_eq!(g.canonical(n(img3)), n(img1));
    assert!(g.is_canonical(n(sb2)));
}

#[test]
fn owned_property_sets_follow_their_owner() {
    let mut s = Scene::new();
    let (root, b1, b2) = two_brushes(&mut s, Color::rgb(4, 4, 4), Color::rgb(4, 4, 4));
    let mut sets = Vec::new();
    for b in [b1, b2] {
        let ps = s.set_property(b, "Tint", PropertyValue::Scalar(0.5)).unwrap();
        let expr = s.expression_animation("p.Tint", vec![("p".to_string(), ps)]);
        s.animate(b, "Opacity", expr).unwrap();
        sets.push(ps);
    }

    let mut g = graph_of(&s, root);
    canonicalize(&mut g, &s, &CanonicalizeOpts::default()).unwrap();
    let n = |r| g.node_of(r).unwrap();
    assert_eq!(g.canonical(n(b2)), n(b1));
    assert_eq!(g.canonical(n(sets[1])), n(sets[0]));
    assert!(g.is_canonical(n(sets[0])));
}

#[test]
fn differing_owned_sets_keep_owners_apart() {
    let mut s = Scene::new();
    let (root, b1, b2) = two_brushes(&mut s, Color::rgb(4, 4, 4), Color::rgb(4, 4, 4));
    s.set_property(b1, "Tint", PropertyValue::Scalar(0.5)).unwrap();
    s.set_property(b2, "Tint", PropertyValue::Scalar(0.25)).unwrap();

    let mut g = graph_of(&s, root);
    canonicalize(&mut g, &s, &CanonicalizeOpts::default()).unwrap();
    assert!(g.is_canonical(g.node_of(b2).unwrap()));
}
