use super::*;
use crate::foundation::core::{BezPath, Color, Point, Ticks};
use crate::plan::planner::{PlannerOpts, plan_single};
use crate::plan::trace::{Step, TraceEmitter};
use crate::scene::arena::Scene;
use crate::scene::model::{
    CompositionPath, FillRule, ObjectRef, PathGeometry, PropertyValue,
};

fn emit(s: &Scene, root: ObjectRef) -> crate::plan::trace::Trace {
    let plan = plan_single(s, root, &PlannerOpts::default()).unwrap();
    let mut emitter = TraceEmitter::new();
    generate(&plan, &mut emitter).unwrap();
    emitter.finish()
}

fn path_scene() -> (Scene, ObjectRef) {
    let mut s = Scene::new();
    let mut bez = BezPath::new();
    bez.move_to(Point::new(0.0, 0.0));
    bez.line_to(Point::new(4.0, 0.0));
    bez.line_to(Point::new(4.0, 4.0));
    bez.close_path();
    let data = s.add(ObjectBody::PathData(PathData {
        path: bez,
        fill_rule: FillRule::Winding,
    }));
    let wrapper = s.add(ObjectBody::CompositionPath(CompositionPath { source: data }));
    let geom = s.add(ObjectBody::PathGeometry(PathGeometry {
        path: Some(wrapper),
        ..PathGeometry::default()
    }));
    let sprite = s.sprite_shape(geom, None);
    let root = s.container_shape(vec![sprite]);
    (s, root)
}

#[test]
fn shared_image_is_created_once_and_read_by_both_users() {
    let mut s = Scene::new();
    let img = s.image_surface(b"\x89PNG-logo", 4, 4);
    let b1 = s.surface_brush(img);
    let b2 = s.surface_brush(img);
    let rect = s.rectangle(4.0, 4.0);
    let a = s.sprite_shape(rect, Some(b1));
    let b = s.sprite_shape(rect, Some(b2));
    let root = s.container_shape(vec![a, b]);

    let trace = emit(&s, root);
    let shared = trace.factory_names(None);
    assert_eq!(shared.len(), 1);
    let image = shared[0].to_string();
    for brush in ["SurfaceBrush_0", "SurfaceBrush_1"] {
        let f = trace.factory(Some(VariantId(0)), brush).unwrap();
        assert_eq!(f.steps, vec![Step::Read(image.clone())]);
    }
    let stats = trace.replay().unwrap();
    assert_eq!(stats.constructed, 7);
}

#[test]
fn second_caller_reads_the_stored_object() {
    let mut s = Scene::new();
    let rect = s.rectangle(1.0, 1.0);
    let brush = s.color_brush(Color::rgb(0, 0, 0));
    let a = s.sprite_shape(rect, Some(brush));
    let b = s.sprite_shape(rect, Some(brush));
    let root = s.container_shape(vec![a, b]);

    let trace = emit(&s, root);
    let v = Some(VariantId(0));
    assert_eq!(
        trace.factory(v, "SpriteShape_0").unwrap().steps,
        vec![
            Step::Call("RectangleGeometry".into()),
            Step::Call("ColorBrush_FF000000".into())
        ]
    );
    assert_eq!(
        trace.factory(v, "SpriteShape_1").unwrap().steps,
        vec![
            Step::Read("RectangleGeometry".into()),
            Step::Read("ColorBrush_FF000000".into())
        ]
    );
    trace.replay().unwrap();
}

#[test]
fn same_callee_in_two_slots_is_called_then_read() {
    let mut s = Scene::new();
    let rect = s.rectangle(1.0, 1.0);
    let brush = s.color_brush(Color::rgb(7, 7, 7));
    let sprite = s.sprite_shape(rect, Some(brush));
    if let ObjectBody::SpriteShape(shape) = &mut s.object_mut(sprite).unwrap().body {
        shape.stroke_brush = Some(brush);
    }
    let trace = emit(&s, sprite);
    assert_eq!(
        trace.factory(Some(VariantId(0)), "SpriteShape").unwrap().steps,
        vec![
            Step::Call("RectangleGeometry".into()),
            Step::Call("ColorBrush_FF070707".into()),
            Step::Read("ColorBrush_FF070707".into())
        ]
    );
    trace.replay().unwrap();
}

#[test]
fn path_data_goes_through_the_hook_and_wrapper_is_inlined() {
    let (s, root) = path_scene();
    let trace = emit(&s, root);
    assert_eq!(trace.path_hooks, 1);
    assert_eq!(trace.inline_requests, 1);
    assert!(
        trace
            .factory(Some(VariantId(0)), "CompositionPath")
            .is_none()
    );
    assert_eq!(
        trace.factory(Some(VariantId(0)), "PathGeometry").unwrap().steps,
        vec![Step::Call("PathData".into())]
    );
    trace.replay().unwrap();
}

struct PlainEmitter;

impl Emitter for PlainEmitter {
    fn begin_variant(&mut self, _: &VariantHeader<'_>) -> CompgraphResult<()> {
        Ok(())
    }
    fn end_variant(&mut self, _: &VariantHeader<'_>) -> CompgraphResult<()> {
        Ok(())
    }
    fn declare_field(&mut self, _: &FieldDecl<'_>) -> CompgraphResult<()> {
        Ok(())
    }
    fn begin_factory(&mut self, _: &FactoryHeader<'_>) -> CompgraphResult<()> {
        Ok(())
    }
    fn write_object(&mut self, _: &ObjectContext<'_>) -> CompgraphResult<()> {
        Ok(())
    }
    fn inline_expression(&mut self, ctx: &ObjectContext<'_>) -> CompgraphResult<String> {
        Ok(ctx.kind().name().to_string())
    }
    fn end_factory(&mut self, _: &FactoryHeader<'_>) -> CompgraphResult<()> {
        Ok(())
    }
}

#[test]
fn emitter_without_path_hook_refuses_path_data() {
    let (s, root) = path_scene();
    let plan = plan_single(&s, root, &PlannerOpts::default()).unwrap();
    let err = generate(&plan, &mut PlainEmitter).unwrap_err();
    assert!(matches!(err, CompgraphError::UnsupportedKind { .. }));
}

#[test]
fn inline_text_is_evaluated_once() {
    let (s, root) = path_scene();
    let plan = plan_single(&s, root, &PlannerOpts::default()).unwrap();
    let v = &plan.variants[0];
    let wrapper = v
        .graph()
        .nodes()
        .find(|(_, n)| n.kind() == ObjectKind::CompositionPath)
        .map(|(id, _)| id)
        .unwrap();
    let CallSite::Inline(thunk) = &v.annotation(wrapper).call_site else {
        panic!("wrapper is not inlined");
    };
    assert!(!thunk.is_evaluated());
    let mut emitter = TraceEmitter::new();
    generate(&plan, &mut emitter).unwrap();
    assert!(thunk.is_evaluated());
    let again = thunk
        .text_or_try_init(|| panic!("evaluated twice"))
        .unwrap();
    assert_eq!(again, "inline#0");
}

#[test]
fn helper_is_configured_at_every_use() {
    let mut s = Scene::new();
    let geom = s.ellipse(2.0, 2.0);
    let expr = s.expression_animation("g.Radius.X", vec![("g".to_string(), geom)]);
    let b1 = s.color_brush(Color::rgb(1, 2, 3));
    let b2 = s.color_brush(Color::rgb(4, 5, 6));
    s.animate(b1, "Color", expr).unwrap();
    s.animate(b2, "Color", expr).unwrap();
    let rect = s.rectangle(1.0, 1.0);
    let a = s.sprite_shape(rect, Some(b1));
    let b = s.sprite_shape(rect, Some(b2));
    let c = s.sprite_shape(geom, None);
    let root = s.container_shape(vec![a, b, c]);

    let trace = emit(&s, root);
    let v = Some(VariantId(0));
    assert_eq!(
        trace.factory(v, "ColorBrush_FF010203").unwrap().steps,
        vec![Step::Call("EllipseGeometry".into())]
    );
    assert_eq!(
        trace.factory(v, "ColorBrush_FF040506").unwrap().steps,
        vec![Step::Read("EllipseGeometry".into())]
    );
    assert!(trace.factory(v, "ExpressionAnimation").is_none());
    trace.replay().unwrap();
}

#[test]
fn foreign_property_set_goes_through_its_owner() {
    let mut s = Scene::new();
    let rect = s.rectangle(1.0, 1.0);
    let source = s.sprite_shape(rect, None);
    let props = s
        .set_property(source, "Color", PropertyValue::Color(Color::rgb(5, 5, 5)))
        .unwrap();
    let expr = s.expression_animation("p.Color", vec![("p".to_string(), props)]);
    let brush = s.color_brush(Color::rgb(0, 0, 0));
    s.animate(brush, "Color", expr).unwrap();
    let user = s.sprite_shape(rect, Some(brush));
    let root = s.container_shape(vec![user, source]);

    let plan = plan_single(&s, root, &PlannerOpts::default()).unwrap();
    let v = &plan.variants[0];
    let source_name = v.annotation_of(source).unwrap().name().unwrap().to_string();
    let mut emitter = TraceEmitter::new();
    generate(&plan, &mut emitter).unwrap();
    let trace = emitter.finish();
    assert_eq!(
        trace.factory(Some(VariantId(0)), "ColorBrush_FF000000").unwrap().steps,
        vec![Step::Call(source_name.clone())]
    );
    assert_eq!(
        trace.factory(Some(VariantId(0)), "ContainerShape").unwrap().steps,
        vec![Step::Call("SpriteShape_0".into()), Step::Read(source_name)]
    );
    trace.replay().unwrap();
}

#[test]
fn owned_configuration_is_nested_in_the_owner() {
    struct Capture(Vec<FactoryRef>);
    impl Emitter for Capture {
        fn begin_variant(&mut self, _: &VariantHeader<'_>) -> CompgraphResult<()> {
            Ok(())
        }
        fn end_variant(&mut self, _: &VariantHeader<'_>) -> CompgraphResult<()> {
            Ok(())
        }
        fn declare_field(&mut self, _: &FieldDecl<'_>) -> CompgraphResult<()> {
            Ok(())
        }
        fn begin_factory(&mut self, _: &FactoryHeader<'_>) -> CompgraphResult<()> {
            Ok(())
        }
        fn write_object(&mut self, ctx: &ObjectContext<'_>) -> CompgraphResult<()> {
            if ctx.kind() == ObjectKind::SpriteShape {
                for r in &ctx.refs {
                    self.0.push(r.via.clone());
                    if let Some(config) = &r.config {
                        self.0.extend(config.refs.iter().map(|r| r.via.clone()));
                    }
                }
            }
            Ok(())
        }
        fn inline_expression(&mut self, _: &ObjectContext<'_>) -> CompgraphResult<String> {
            Ok(String::new())
        }
        fn end_factory(&mut self, _: &FactoryHeader<'_>) -> CompgraphResult<()> {
            Ok(())
        }
    }

    let mut s = Scene::new();
    let rect = s.rectangle(1.0, 1.0);
    let sprite = s.sprite_shape(rect, None);
    let anim = s.scalar_animation(0.0, 1.0, Ticks::from_millis(100), None);
    s.animate_with_controller(sprite, "TrimEnd", anim, true)
        .unwrap();
    let props = s
        .set_property(sprite, "Progress", PropertyValue::Scalar(0.0))
        .unwrap();
    let tint = s.scalar_animation(0.0, 1.0, Ticks::from_millis(100), None);
    s.animate(props, "Progress", tint).unwrap();

    let plan = plan_single(&s, sprite, &PlannerOpts::default()).unwrap();
    let mut capture = Capture(Vec::new());
    generate(&plan, &mut capture).unwrap();
    assert_eq!(
        capture.0,
        vec![
            FactoryRef::Call {
                name: "RectangleGeometry".into()
            },
            FactoryRef::Call {
                name: "ScalarKeyFrameAnimation_0".into()
            },
            FactoryRef::Controller {
                target: Box::new(FactoryRef::This),
                property: "TrimEnd".into()
            },
            FactoryRef::OwnerProperties {
                owner: Box::new(FactoryRef::This)
            },
            FactoryRef::Call {
                name: "ScalarKeyFrameAnimation_1".into()
            },
        ]
    );
}

#[test]
fn helper_reference_to_its_own_user_is_the_object_under_construction() {
    let mut s = Scene::new();
    let brush = s.color_brush(Color::rgb(3, 3, 3));
    let expr = s.expression_animation("my.Color", vec![("my".to_string(), brush)]);
    s.animate(brush, "Color", expr).unwrap();
    let rect = s.rectangle(1.0, 1.0);
    let sprite = s.sprite_shape(rect, Some(brush));

    let trace = emit(&s, sprite);
    let v = Some(VariantId(0));
    let f = trace.factory(v, "ColorBrush_FF030303").unwrap();
    assert!(!f.stored);
    assert!(f.steps.is_empty());
    trace.replay().unwrap();
}
