use super::*;
use crate::foundation::core::{Color, Ticks};
use crate::scene::model::{ObjectKind, PropertyValue};

#[test]
fn edges_are_numbered_in_execution_order() {
    let mut s = Scene::new();
    let brush = s.color_brush(Color::rgb(1, 1, 1));
    let rect = s.rectangle(2.0, 2.0);
    let a = s.sprite_shape(rect, Some(brush));
    let b = s.sprite_shape(rect, Some(brush));
    let root = s.container_shape(vec![a, b]);

    let g = ObjectGraph::build(&s, root).unwrap();
    assert_eq!(g.len(), 5);
    assert_eq!(g.edge_count(), 6);

    // root -> a (1), a -> rect (2), a -> brush (3), root -> b (4), b -> rect (5), b -> brush (6)
    let rect_id = g.node_of(rect).unwrap();
    let positions: Vec<u32> = g
        .node(rect_id)
        .in_edges()
        .iter()
        .map(|e| e.position.0)
        .collect();
    assert_eq!(positions, vec![2, 5]);
    assert_eq!(g.node_of(a), Some(NodeId(1)));
    assert_eq!(g.node_of(b), Some(NodeId(4)));
    assert_eq!(g.first_in_edge(g.root()), None);
}

#[test]
fn shared_substructure_is_visited_once() {
    let mut s = Scene::new();
    let brush = s.color_brush(Color::rgb(1, 1, 1));
    let rect = s.rectangle(2.0, 2.0);
    let mut shapes = Vec::new();
    for _ in 0..50 {
        shapes.push(s.sprite_shape(rect, Some(brush)));
    }
    let root = s.container_shape(shapes);
    let g = ObjectGraph::build(&s, root).unwrap();
    assert_eq!(g.len(), 53);
    assert_eq!(g.parents(g.node_of(rect).unwrap()).len(), 50);
}

#[test]
fn animators_follow_body_refs_and_properties_come_last() {
    let mut s = Scene::new();
    let rect = s.rectangle(2.0, 2.0);
    let sprite = s.sprite_shape(rect, None);
    let anim = s.scalar_animation(0.0, 1.0, Ticks::from_millis(500), None);
    let controller = s.animate_with_controller(sprite, "TrimEnd", anim, true).unwrap();
    let props = s
        .set_property(sprite, "Progress", PropertyValue::Scalar(0.0))
        .unwrap();
    let root = s.container_shape(vec![sprite]);

    let g = ObjectGraph::build(&s, root).unwrap();
    let sprite_id = g.node_of(sprite).unwrap();
    let roles: Vec<Role> = g
        .node(sprite_id)
        .out_edges()
        .iter()
        .map(|e| e.role.clone())
        .collect();
    assert_eq!(
        roles,
        vec![
            Role::Slot("Geometry"),
            Role::Animation("TrimEnd".to_string()),
            Role::Controller("TrimEnd".to_string()),
            Role::Properties,
        ]
    );
    let ctl = g.node_of(controller).unwrap();
    assert_eq!(g.node(ctl).owner(), Some(sprite_id));
    assert_eq!(g.node(ctl).kind(), ObjectKind::AnimationController);
    assert_eq!(g.node(g.node_of(props).unwrap()).owner(), Some(sprite_id));
    assert!(g.node(sprite_id).is_animated());
}

#[test]
fn foreign_owned_set_goes_through_owner_lookup() {
    let mut s = Scene::new();
    let rect = s.rectangle(2.0, 2.0);
    let source = s.sprite_shape(rect, None);
    let props = s
        .set_property(source, "Color", PropertyValue::Color(Color::rgb(5, 5, 5)))
        .unwrap();
    let expr = s.expression_animation("p.Color", vec![("p".to_string(), props)]);
    let brush = s.color_brush(Color::rgb(0, 0, 0));
    s.animate(brush, "Color", expr).unwrap();
    let user = s.sprite_shape(rect, Some(brush));
    // The expression reads `source`'s properties before `source` itself is placed.
    let root = s.container_shape(vec![user, source]);

    let g = ObjectGraph::build(&s, root).unwrap();
    let expr_id = g.node_of(expr).unwrap();
    let edges = g.node(expr_id).out_edges();
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].role, Role::OwnerLookup);
    assert_eq!(edges[0].target, g.node_of(source).unwrap());
    assert_eq!(edges[1].role, Role::Parameter("p".to_string()));
    assert_eq!(edges[1].target, g.node_of(props).unwrap());
    assert!(edges[0].position < edges[1].position);

    // Owner lookups are not parents.
    let source_id = g.node_of(source).unwrap();
    assert_eq!(g.parents(source_id).as_slice(), &[g.root()]);
}

#[test]
fn copied_value_is_assigned_once() {
    let mut s = Scene::new();
    let root = s.linear_easing();
    let mut g = ObjectGraph::build(&s, root).unwrap();
    let mut out = Scene::new();
    let a = out.linear_easing();
    g.set_copied_value(g.root(), a).unwrap();
    let err = g.set_copied_value(g.root(), a).unwrap_err();
    assert!(err.is_engine_fault());
    assert_eq!(g.copied_value(g.root()), Some(a));
}

#[test]
fn owned_root_is_rejected() {
    let mut s = Scene::new();
    let v = s.container_visual(vec![]);
    let ps = s.ensure_properties(v).unwrap();
    assert!(ObjectGraph::build(&s, ps).is_err());
}

#[test]
fn owned_set_is_descended_from_its_owner() {
    let mut s = Scene::new();
    let brush = s.color_brush(Color::rgb(1, 1, 1));
    let props = s
        .set_property(brush, "Tint", PropertyValue::Scalar(0.0))
        .unwrap();
    let tint = s.scalar_animation(0.0, 1.0, Ticks::from_millis(100), None);
    s.animate(props, "Tint", tint).unwrap();
    let expr = s.expression_animation("p.Tint", vec![("p".to_string(), props)]);
    s.animate(brush, "Opacity", expr).unwrap();
    let rect = s.rectangle(1.0, 1.0);
    let root = s.sprite_shape(rect, Some(brush));

    let g = ObjectGraph::build(&s, root).unwrap();
    let props_id = g.node_of(props).unwrap();
    let first_into_props = g.first_in_edge(props_id).unwrap();
    assert_eq!(first_into_props.role, Role::Parameter("p".to_string()));

    let properties_edge = g
        .node(g.node_of(brush).unwrap())
        .out_edges()
        .iter()
        .find(|e| e.role == Role::Properties)
        .unwrap()
        .position;
    let tint_edge = g.first_in_edge(g.node_of(tint).unwrap()).unwrap().position;
    assert!(tint_edge > properties_edge);
}
