//! Small construction helpers for building scenes programmatically.
//!
//! Hosts translating another animation format build scenes through [`Scene::insert`]; these
//! helpers cover the common objects so tests and small tools stay readable.

use crate::foundation::core::{Color, Ticks, Vec2};
use crate::foundation::error::{CompgraphError, CompgraphResult};
use crate::scene::arena::Scene;
use crate::scene::model::{
    Animator, ColorBrush, ContainerShape, ContainerVisual, CubicBezierEasing, EllipseGeometry,
    ExpressionAnimation, KeyFrame, KeyFrameAnimation, KeyFrameType, KeyFrameValue,
    LoadedImageSurface, ObjectBody, ObjectRef, PropertyValue, RectangleGeometry, ShapeVisual,
    SpriteShape, SurfaceBrush,
};

impl Scene {
    pub fn color_brush(&mut self, color: Color) -> ObjectRef {
        self.add(ObjectBody::ColorBrush(ColorBrush { color: Some(color) }))
    }

    pub fn rectangle(&mut self, width: f64, height: f64) -> ObjectRef {
        self.add(ObjectBody::RectangleGeometry(RectangleGeometry {
            trim: Default::default(),
            offset: None,
            size: Vec2::new(width, height),
        }))
    }

    pub fn ellipse(&mut self, rx: f64, ry: f64) -> ObjectRef {
        self.add(ObjectBody::EllipseGeometry(EllipseGeometry {
            trim: Default::default(),
            center: None,
            radius: Vec2::new(rx, ry),
        }))
    }

    pub fn sprite_shape(&mut self, geometry: ObjectRef, fill: Option<ObjectRef>) -> ObjectRef {
        self.add(ObjectBody::SpriteShape(SpriteShape {
            geometry: Some(geometry),
            fill_brush: fill,
            ..SpriteShape::default()
        }))
    }

    pub fn container_shape(&mut self, shapes: Vec<ObjectRef>) -> ObjectRef {
        self.add(ObjectBody::ContainerShape(ContainerShape {
            props: Default::default(),
            shapes,
        }))
    }

    pub fn shape_visual(&mut self, shapes: Vec<ObjectRef>) -> ObjectRef {
        self.add(ObjectBody::ShapeVisual(ShapeVisual {
            shapes,
            ..ShapeVisual::default()
        }))
    }

    pub fn container_visual(&mut self, children: Vec<ObjectRef>) -> ObjectRef {
        self.add(ObjectBody::ContainerVisual(ContainerVisual {
            props: Default::default(),
            children,
        }))
    }

    /// Image surface "loaded" from encoded bytes. Each call is a separate load.
    pub fn image_surface(&mut self, data: &[u8], width: u32, height: u32) -> ObjectRef {
        self.add(ObjectBody::LoadedImageSurface(LoadedImageSurface {
            data: data.to_vec(),
            width,
            height,
        }))
    }

    pub fn surface_brush(&mut self, surface: ObjectRef) -> ObjectRef {
        self.add(ObjectBody::SurfaceBrush(SurfaceBrush {
            surface: Some(surface),
            ..SurfaceBrush::default()
        }))
    }

    pub fn linear_easing(&mut self) -> ObjectRef {
        self.add(ObjectBody::LinearEasing)
    }

    pub fn cubic_bezier_easing(&mut self, cp1: Vec2, cp2: Vec2) -> ObjectRef {
        self.add(ObjectBody::CubicBezierEasing(CubicBezierEasing {
            control_point_1: cp1,
            control_point_2: cp2,
        }))
    }

    /// Two-key-frame scalar animation; `easing` applies to the final key frame.
    pub fn scalar_animation(
        &mut self,
        from: f64,
        to: f64,
        duration: Ticks,
        easing: Option<ObjectRef>,
    ) -> ObjectRef {
        self.add(ObjectBody::KeyFrameAnimation(KeyFrameAnimation {
            value_type: KeyFrameType::Scalar,
            duration,
            key_frames: vec![
                KeyFrame {
                    progress: 0.0,
                    value: KeyFrameValue::Scalar(from),
                    easing: None,
                },
                KeyFrame {
                    progress: 1.0,
                    value: KeyFrameValue::Scalar(to),
                    easing,
                },
            ],
            reference_parameters: Vec::new(),
        }))
    }

    pub fn expression_animation(
        &mut self,
        expression: &str,
        parameters: Vec<(String, ObjectRef)>,
    ) -> ObjectRef {
        self.add(ObjectBody::ExpressionAnimation(ExpressionAnimation {
            expression: expression.to_string(),
            reference_parameters: parameters,
            target: None,
        }))
    }

    /// Attach `animation` to `property` of `target`.
    pub fn animate(
        &mut self,
        target: ObjectRef,
        property: &str,
        animation: ObjectRef,
    ) -> CompgraphResult<()> {
        self.check_ref(animation)?;
        self.object_mut(target)?.animators.push(Animator {
            property: property.to_string(),
            animation,
            controller: None,
        });
        Ok(())
    }

    /// Attach `animation` to `property` of `target` and obtain its controller.
    pub fn animate_with_controller(
        &mut self,
        target: ObjectRef,
        property: &str,
        animation: ObjectRef,
        paused: bool,
    ) -> CompgraphResult<ObjectRef> {
        let controller = self.animation_controller(target, property)?;
        if let ObjectBody::AnimationController(c) = &mut self.object_mut(controller)?.body {
            c.paused = paused;
        }
        self.check_ref(animation)?;
        self.object_mut(target)?.animators.push(Animator {
            property: property.to_string(),
            animation,
            controller: Some(controller),
        });
        Ok(controller)
    }

    /// Set the descriptive labels of `r`.
    pub fn describe(
        &mut self,
        r: ObjectRef,
        short: &str,
        long: Option<&str>,
    ) -> CompgraphResult<()> {
        let obj = self.object_mut(r)?;
        obj.description.short = Some(short.to_string());
        obj.description.long = long.map(str::to_string);
        Ok(())
    }

    /// Insert or replace a named value in the property set owned by `owner`.
    pub fn set_property(
        &mut self,
        owner: ObjectRef,
        name: &str,
        value: PropertyValue,
    ) -> CompgraphResult<ObjectRef> {
        let ps = self.ensure_properties(owner)?;
        match &mut self.object_mut(ps)?.body {
            ObjectBody::PropertySet(set) => {
                set.values.insert(name.to_string(), value);
                Ok(ps)
            }
            other => Err(CompgraphError::invariant(
                "owned-properties",
                ps,
                format!("owner's property slot holds a {}", other.kind().name()),
            )),
        }
    }
}
