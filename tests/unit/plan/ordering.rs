use super::*;
use crate::foundation::core::Color;
use crate::scene::arena::Scene;

fn two_users() -> (Scene, crate::scene::model::ObjectRef) {
    let mut s = Scene::new();
    let brush = s.color_brush(Color::rgb(9, 9, 9));
    let rect = s.rectangle(1.0, 1.0);
    let a = s.sprite_shape(rect, Some(brush));
    let b = s.sprite_shape(rect, Some(brush));
    let root = s.container_shape(vec![a, b]);
    (s, root)
}

#[test]
fn first_caller_invokes_later_callers_read() {
    let (s, root) = two_users();
    let g = ObjectGraph::build(&s, root).unwrap();
    let a = NodeId(1);
    let b = NodeId(4);
    let rect = NodeId(2);
    let ordering = CallOrdering::new();

    assert_eq!(
        ordering.call_kind(&g, a, rect, false).unwrap(),
        CallKind::InvokeFactory
    );
    assert_eq!(
        ordering.call_kind(&g, b, rect, false).unwrap(),
        CallKind::ReadStorage
    );
    assert_eq!(
        ordering.call_kind(&g, g.root(), a, false).unwrap(),
        CallKind::InvokeFactory
    );
}

#[test]
fn decisions_are_memoized_per_pair() {
    let (s, root) = two_users();
    let g = ObjectGraph::build(&s, root).unwrap();
    let ordering = CallOrdering::new();
    for _ in 0..5 {
        ordering.call_kind(&g, NodeId(1), NodeId(2), false).unwrap();
        ordering.call_kind(&g, NodeId(4), NodeId(2), false).unwrap();
    }
    assert_eq!(ordering.computed(), 2);
}

#[test]
fn shared_callee_is_always_read() {
    let (s, root) = two_users();
    let g = ObjectGraph::build(&s, root).unwrap();
    let ordering = CallOrdering::new();
    assert_eq!(
        ordering.call_kind(&g, NodeId(1), NodeId(2), true).unwrap(),
        CallKind::ReadStorage
    );
}

#[test]
fn pair_without_edge_is_an_invariant_fault() {
    let (s, root) = two_users();
    let g = ObjectGraph::build(&s, root).unwrap();
    let ordering = CallOrdering::new();
    let err = ordering.call_kind(&g, NodeId(2), NodeId(1), false).unwrap_err();
    assert!(err.is_engine_fault());
    assert_eq!(ordering.computed(), 0);
}
