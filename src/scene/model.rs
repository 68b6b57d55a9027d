use std::collections::BTreeMap;

use crate::foundation::core::{Affine, BezPath, Color, Ticks, Vec2, Vector3, Vector4};
use crate::foundation::error::{CompgraphError, CompgraphResult};

/// Arena stamp distinguishing one [`crate::Scene`] from every other scene in the process.
///
/// `SceneId(0)` is the unbound stamp carried by references freshly deserialized from a scene
/// file, before [`crate::Scene::from_file`] rebinds them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneId(pub(crate) u32);

impl SceneId {
    pub(crate) const UNBOUND: SceneId = SceneId(0);
}

/// Opaque identity handle of one scene object.
///
/// Equality is reference equality: two objects with identical content are still distinct
/// identities. The arena stamp makes a reference that leaked out of its scene detectable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectRef {
    pub(crate) scene: SceneId,
    pub(crate) index: u32,
}

impl ObjectRef {
    /// Arena stamp of the scene this reference belongs to.
    pub fn scene(self) -> SceneId {
        self.scene
    }

    /// Slot index inside the owning scene.
    pub fn index(self) -> u32 {
        self.index
    }
}

impl std::fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}@{}", self.index, self.scene.0)
    }
}

impl serde::Serialize for ObjectRef {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u32(self.index)
    }
}

impl<'de> serde::Deserialize<'de> for ObjectRef {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let index = u32::deserialize(d)?;
        Ok(ObjectRef {
            scene: SceneId::UNBOUND,
            index,
        })
    }
}

/// How a reference participates in its referrer.
///
/// Structural slots (a sprite shape's fill vs. stroke brush) are distinguished from plain list
/// membership; both are significant for structural equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Named single-valued slot.
    Slot(&'static str),
    /// Ordered membership of a named list.
    Item(&'static str),
    /// Named reference parameter (expression parameters, effect sources).
    Parameter(String),
    /// Animation attached to the named property.
    Animation(String),
    /// Controller of the animation attached to the named property.
    Controller(String),
    /// The owner's property set.
    Properties,
    /// Synthesized by the graph builder: "read the owner of the sub-object referenced next".
    OwnerLookup,
}

impl Role {
    /// Roles that exist only as a consequence of another edge.
    pub fn is_derived(&self) -> bool {
        matches!(self, Role::OwnerLookup)
    }

    /// Roles whose referent is an implicit part of the referrer.
    pub fn is_implicit(&self) -> bool {
        matches!(self, Role::Properties | Role::Controller(_))
    }
}

/// Coarse grouping of [`ObjectKind`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectFamily {
    Visual,
    Shape,
    Geometry,
    Path,
    Brush,
    Effect,
    Surface,
    Clip,
    ViewBox,
    Easing,
    Animation,
    PropertySet,
    Controller,
}

macro_rules! object_kinds {
    ($($kind:ident => $family:ident,)*) => {
        /// Closed set of object kinds; mirrors the cases of [`ObjectBody`].
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
        pub enum ObjectKind {
            $(
                #[allow(missing_docs)]
                $kind,
            )*
        }

        impl ObjectKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [ObjectKind] = &[$(ObjectKind::$kind,)*];

            /// Family the kind belongs to.
            pub fn family(self) -> ObjectFamily {
                match self {
                    $(ObjectKind::$kind => ObjectFamily::$family,)*
                }
            }

            /// Kind tag as spelled in scene files.
            pub fn name(self) -> &'static str {
                match self {
                    $(ObjectKind::$kind => stringify!($kind),)*
                }
            }

            /// Look up a kind by its scene-file tag.
            pub fn from_name(name: &str) -> Option<ObjectKind> {
                match name {
                    $(stringify!($kind) => Some(ObjectKind::$kind),)*
                    _ => None,
                }
            }
        }
    };
}

object_kinds! {
    ContainerVisual => Visual,
    ShapeVisual => Visual,
    SpriteVisual => Visual,
    LayerVisual => Visual,
    ContainerShape => Shape,
    SpriteShape => Shape,
    EllipseGeometry => Geometry,
    RectangleGeometry => Geometry,
    RoundedRectangleGeometry => Geometry,
    PathGeometry => Geometry,
    CompositionPath => Path,
    PathData => Path,
    ColorBrush => Brush,
    LinearGradientBrush => Brush,
    RadialGradientBrush => Brush,
    ColorGradientStop => Brush,
    SurfaceBrush => Brush,
    EffectBrush => Brush,
    GaussianBlurEffect => Effect,
    CompositeEffect => Effect,
    DropShadow => Effect,
    LoadedImageSurface => Surface,
    VisualSurface => Surface,
    InsetClip => Clip,
    GeometricClip => Clip,
    ViewBox => ViewBox,
    LinearEasing => Easing,
    CubicBezierEasing => Easing,
    StepEasing => Easing,
    BooleanKeyFrameAnimation => Animation,
    ColorKeyFrameAnimation => Animation,
    PathKeyFrameAnimation => Animation,
    ScalarKeyFrameAnimation => Animation,
    Vector2KeyFrameAnimation => Animation,
    Vector3KeyFrameAnimation => Animation,
    Vector4KeyFrameAnimation => Animation,
    ExpressionAnimation => Animation,
    PropertySet => PropertySet,
    AnimationController => Controller,
}

impl ObjectKind {
    /// Visuals and shapes: the target API lets them have a single parent only.
    pub fn is_tree_kind(self) -> bool {
        matches!(self.family(), ObjectFamily::Visual | ObjectFamily::Shape)
    }

    /// Container kinds the tree reducer may collapse.
    pub fn is_container(self) -> bool {
        matches!(self, ObjectKind::ContainerVisual | ObjectKind::ContainerShape)
    }

    /// Trivial leaf kinds whose construction can be written at the single use site.
    pub fn is_inlinable(self) -> bool {
        matches!(
            self,
            ObjectKind::CompositionPath
                | ObjectKind::ColorGradientStop
                | ObjectKind::LinearEasing
                | ObjectKind::CubicBezierEasing
                | ObjectKind::StepEasing
                | ObjectKind::InsetClip
        )
    }

    /// Externally loaded assets, created once at the outer scope and shared by variants.
    pub fn is_shared_asset(self) -> bool {
        matches!(self, ObjectKind::LoadedImageSurface)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Descriptive label pair, used only for names and generated comments.
pub struct Description {
    /// Short label (feeds generated names).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    /// Long free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
}

impl Description {
    /// `true` when neither label is set.
    pub fn is_empty(&self) -> bool {
        self.short.is_none() && self.long.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Animation attached to one property of its owner.
pub struct Animator {
    /// Animated property name (`"Offset"`, `"Opacity"`, `"Progress"`, ...).
    pub property: String,
    /// Animation object.
    pub animation: ObjectRef,
    /// Controller obtained for `(owner, property)`, when the animation is externally driven.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<ObjectRef>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One object of a scene: kind-specific body, descriptive labels, animators.
pub struct SceneObject {
    /// Kind-specific fields and references.
    #[serde(flatten)]
    pub body: ObjectBody,
    /// Descriptive labels.
    #[serde(default, skip_serializing_if = "Description::is_empty")]
    pub description: Description,
    /// Attached animators, in attachment order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animators: Vec<Animator>,
}

impl SceneObject {
    /// Object with no labels and no animators.
    pub fn new(body: ObjectBody) -> Self {
        Self {
            body,
            description: Description::default(),
            animators: Vec::new(),
        }
    }

    /// Kind of the body.
    pub fn kind(&self) -> ObjectKind {
        self.body.kind()
    }

    /// Outgoing references in canonical enumeration order: body, then animators.
    pub fn refs(&self) -> Vec<(Role, ObjectRef)> {
        let mut out = Vec::new();
        self.body.for_each_ref(|role, r| out.push((role, r)));
        for a in &self.animators {
            out.push((Role::Animation(a.property.clone()), a.animation));
            if let Some(c) = a.controller {
                out.push((Role::Controller(a.property.clone()), c));
            }
        }
        out
    }

    /// Rewrite every outgoing reference (body and animators) through `f`.
    pub fn try_map_refs(
        &mut self,
        f: &mut dyn FnMut(&Role, ObjectRef) -> CompgraphResult<ObjectRef>,
    ) -> CompgraphResult<()> {
        self.body.try_map_refs(f)?;
        for a in &mut self.animators {
            a.animation = f(&Role::Animation(a.property.clone()), a.animation)?;
            if let Some(c) = a.controller.as_mut() {
                *c = f(&Role::Controller(a.property.clone()), *c)?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------------------------
// Shared property groups
// ---------------------------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Properties shared by all visuals. `None` means "target API default".
pub struct VisualProps {
    pub offset: Option<Vector3>,
    pub size: Option<Vec2>,
    pub center_point: Option<Vector3>,
    pub scale: Option<Vector3>,
    pub rotation_degrees: Option<f64>,
    pub opacity: Option<f64>,
    pub is_visible: Option<bool>,
    pub transform: Option<Affine>,
    pub clip: Option<ObjectRef>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Properties shared by all shapes. `None` means "target API default".
pub struct ShapeProps {
    pub offset: Option<Vec2>,
    pub center_point: Option<Vec2>,
    pub scale: Option<Vec2>,
    pub rotation_degrees: Option<f64>,
    pub transform: Option<Affine>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Trim parameters shared by all geometries.
pub struct GeometryTrim {
    pub trim_start: Option<f64>,
    pub trim_end: Option<f64>,
    pub trim_offset: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum StrokeCap {
    Flat,
    Square,
    Round,
    Triangle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LineJoin {
    Miter,
    Bevel,
    Round,
    MiterOrBevel,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Stroke configuration of a sprite shape.
pub struct StrokeStyle {
    pub thickness: Option<f64>,
    pub dash_array: Vec<f64>,
    pub dash_offset: Option<f64>,
    pub start_cap: Option<StrokeCap>,
    pub end_cap: Option<StrokeCap>,
    pub dash_cap: Option<StrokeCap>,
    pub line_join: Option<LineJoin>,
    pub miter_limit: Option<f64>,
    pub is_non_scaling: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FillRule {
    #[default]
    Alternate,
    Winding,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ExtendMode {
    Clamp,
    Wrap,
    Mirror,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MappingMode {
    Absolute,
    Relative,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Stretch {
    None,
    Fill,
    Uniform,
    UniformToFill,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CompositeMode {
    SourceOver,
    DestinationOver,
    DestinationIn,
    DestinationOut,
    SourceIn,
    SourceOut,
    Xor,
    Add,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Properties shared by gradient brushes.
pub struct GradientProps {
    pub stops: Vec<ObjectRef>,
    pub extend_mode: Option<ExtendMode>,
    pub mapping_mode: Option<MappingMode>,
    pub transform: Option<Affine>,
}

// ---------------------------------------------------------------------------------------------
// Per-kind bodies
// ---------------------------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ContainerVisual {
    pub props: VisualProps,
    pub children: Vec<ObjectRef>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShapeVisual {
    pub props: VisualProps,
    pub shapes: Vec<ObjectRef>,
    pub view_box: Option<ObjectRef>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpriteVisual {
    pub props: VisualProps,
    pub brush: Option<ObjectRef>,
    pub shadow: Option<ObjectRef>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayerVisual {
    pub props: VisualProps,
    pub children: Vec<ObjectRef>,
    pub effect: Option<ObjectRef>,
    pub shadow: Option<ObjectRef>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ContainerShape {
    pub props: ShapeProps,
    pub shapes: Vec<ObjectRef>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpriteShape {
    pub props: ShapeProps,
    pub geometry: Option<ObjectRef>,
    pub fill_brush: Option<ObjectRef>,
    pub stroke_brush: Option<ObjectRef>,
    pub stroke: StrokeStyle,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EllipseGeometry {
    #[serde(default)]
    pub trim: GeometryTrim,
    #[serde(default)]
    pub center: Option<Vec2>,
    pub radius: Vec2,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RectangleGeometry {
    #[serde(default)]
    pub trim: GeometryTrim,
    #[serde(default)]
    pub offset: Option<Vec2>,
    pub size: Vec2,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoundedRectangleGeometry {
    #[serde(default)]
    pub trim: GeometryTrim,
    #[serde(default)]
    pub offset: Option<Vec2>,
    pub size: Vec2,
    pub corner_radius: Vec2,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PathGeometry {
    pub trim: GeometryTrim,
    pub path: Option<ObjectRef>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Thin wrapper making path data usable by geometries and path animations.
pub struct CompositionPath {
    pub source: ObjectRef,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Complex geometric path; construction goes through a dedicated emitter hook.
pub struct PathData {
    pub path: BezPath,
    #[serde(default)]
    pub fill_rule: FillRule,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ColorBrush {
    pub color: Option<Color>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LinearGradientBrush {
    pub gradient: GradientProps,
    pub start_point: Option<Vec2>,
    pub end_point: Option<Vec2>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RadialGradientBrush {
    pub gradient: GradientProps,
    pub ellipse_center: Option<Vec2>,
    pub ellipse_radius: Option<Vec2>,
    pub gradient_origin_offset: Option<Vec2>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorGradientStop {
    pub offset: f64,
    pub color: Color,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SurfaceBrush {
    pub surface: Option<ObjectRef>,
    pub stretch: Option<Stretch>,
    pub horizontal_alignment_ratio: Option<f64>,
    pub vertical_alignment_ratio: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EffectBrush {
    pub effect: ObjectRef,
    /// Named source parameters, in the order they are set.
    #[serde(default)]
    pub sources: Vec<(String, ObjectRef)>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GaussianBlurEffect {
    pub blur_amount: f64,
    pub source: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompositeEffect {
    pub mode: CompositeMode,
    pub sources: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DropShadow {
    pub color: Option<Color>,
    pub blur_radius: Option<f64>,
    pub offset: Option<Vector3>,
    pub opacity: Option<f64>,
    pub mask: Option<ObjectRef>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Image surface loaded from encoded bytes.
pub struct LoadedImageSurface {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VisualSurface {
    pub source_visual: Option<ObjectRef>,
    pub source_size: Option<Vec2>,
    pub source_offset: Option<Vec2>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InsetClip {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GeometricClip {
    pub geometry: Option<ObjectRef>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewBox {
    pub size: Vec2,
    #[serde(default)]
    pub offset: Option<Vec2>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CubicBezierEasing {
    pub control_point_1: Vec2,
    pub control_point_2: Vec2,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepEasing {
    pub step_count: u32,
    #[serde(default)]
    pub is_initial_step_single_frame: bool,
    #[serde(default)]
    pub is_final_step_single_frame: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum KeyFrameType {
    Boolean,
    Color,
    Path,
    Scalar,
    Vector2,
    Vector3,
    Vector4,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum KeyFrameValue {
    Boolean(bool),
    Color(Color),
    Path(ObjectRef),
    Scalar(f64),
    Vector2(Vec2),
    Vector3(Vector3),
    Vector4(Vector4),
    /// Expression key frame; valid for every animation type.
    Expression(String),
}

impl KeyFrameValue {
    fn matches(&self, ty: KeyFrameType) -> bool {
        matches!(
            (self, ty),
            (KeyFrameValue::Expression(_), _)
                | (KeyFrameValue::Boolean(_), KeyFrameType::Boolean)
                | (KeyFrameValue::Color(_), KeyFrameType::Color)
                | (KeyFrameValue::Path(_), KeyFrameType::Path)
                | (KeyFrameValue::Scalar(_), KeyFrameType::Scalar)
                | (KeyFrameValue::Vector2(_), KeyFrameType::Vector2)
                | (KeyFrameValue::Vector3(_), KeyFrameType::Vector3)
                | (KeyFrameValue::Vector4(_), KeyFrameType::Vector4)
        )
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyFrame {
    /// Normalized progress in `[0, 1]`.
    pub progress: f64,
    pub value: KeyFrameValue,
    #[serde(default)]
    pub easing: Option<ObjectRef>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyFrameAnimation {
    pub value_type: KeyFrameType,
    pub duration: Ticks,
    pub key_frames: Vec<KeyFrame>,
    #[serde(default)]
    pub reference_parameters: Vec<(String, ObjectRef)>,
}

impl KeyFrameAnimation {
    /// Check key frame ordering and value types.
    pub fn validate(&self) -> CompgraphResult<()> {
        let mut prev = f64::NEG_INFINITY;
        for kf in &self.key_frames {
            if !(0.0..=1.0).contains(&kf.progress) || kf.progress < prev {
                return Err(CompgraphError::validation(format!(
                    "key frame progress {} out of order or outside [0, 1]",
                    kf.progress
                )));
            }
            if !kf.value.matches(self.value_type) {
                return Err(CompgraphError::validation(format!(
                    "{:?} key frame in a {:?} animation",
                    kf.value, self.value_type
                )));
            }
            prev = kf.progress;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExpressionAnimation {
    pub expression: String,
    #[serde(default)]
    pub reference_parameters: Vec<(String, ObjectRef)>,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PropertyValue {
    Boolean(bool),
    Color(Color),
    Scalar(f64),
    Vector2(Vec2),
    Vector3(Vector3),
    Vector4(Vector4),
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Named-value container. Owned sets are reached only through their owner.
pub struct PropertySet {
    /// Non-owning back-reference; `None` for a shared (theme) set.
    pub owner: Option<ObjectRef>,
    pub values: BTreeMap<String, PropertyValue>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Handle controlling the animation of `(target, property)`. Derived, never created directly.
pub struct AnimationController {
    /// Non-owning back-reference to the animated object.
    pub target: ObjectRef,
    pub property: String,
    #[serde(default)]
    pub paused: bool,
}

/// Kind-specific content of a [`SceneObject`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind")]
pub enum ObjectBody {
    ContainerVisual(ContainerVisual),
    ShapeVisual(ShapeVisual),
    SpriteVisual(SpriteVisual),
    LayerVisual(LayerVisual),
    ContainerShape(ContainerShape),
    SpriteShape(SpriteShape),
    EllipseGeometry(EllipseGeometry),
    RectangleGeometry(RectangleGeometry),
    RoundedRectangleGeometry(RoundedRectangleGeometry),
    PathGeometry(PathGeometry),
    CompositionPath(CompositionPath),
    PathData(PathData),
    ColorBrush(ColorBrush),
    LinearGradientBrush(LinearGradientBrush),
    RadialGradientBrush(RadialGradientBrush),
    ColorGradientStop(ColorGradientStop),
    SurfaceBrush(SurfaceBrush),
    EffectBrush(EffectBrush),
    GaussianBlurEffect(GaussianBlurEffect),
    CompositeEffect(CompositeEffect),
    DropShadow(DropShadow),
    LoadedImageSurface(LoadedImageSurface),
    VisualSurface(VisualSurface),
    InsetClip(InsetClip),
    GeometricClip(GeometricClip),
    ViewBox(ViewBox),
    LinearEasing,
    CubicBezierEasing(CubicBezierEasing),
    StepEasing(StepEasing),
    KeyFrameAnimation(KeyFrameAnimation),
    ExpressionAnimation(ExpressionAnimation),
    PropertySet(PropertySet),
    AnimationController(AnimationController),
}

fn opt_ref(out: &mut impl FnMut(Role, ObjectRef), name: &'static str, r: &Option<ObjectRef>) {
    if let Some(r) = r {
        out(Role::Slot(name), *r);
    }
}

fn list_refs(out: &mut impl FnMut(Role, ObjectRef), name: &'static str, v: &[ObjectRef]) {
    for r in v {
        out(Role::Item(name), *r);
    }
}

fn param_refs(out: &mut impl FnMut(Role, ObjectRef), v: &[(String, ObjectRef)]) {
    for (name, r) in v {
        out(Role::Parameter(name.clone()), *r);
    }
}

type RefMapper<'a> = dyn FnMut(&Role, ObjectRef) -> CompgraphResult<ObjectRef> + 'a;

fn map_opt(f: &mut RefMapper<'_>, name: &'static str, r: &mut Option<ObjectRef>) -> CompgraphResult<()> {
    if let Some(r) = r.as_mut() {
        *r = f(&Role::Slot(name), *r)?;
    }
    Ok(())
}

fn map_list(f: &mut RefMapper<'_>, name: &'static str, v: &mut [ObjectRef]) -> CompgraphResult<()> {
    let role = Role::Item(name);
    for r in v {
        *r = f(&role, *r)?;
    }
    Ok(())
}

fn map_params(f: &mut RefMapper<'_>, v: &mut [(String, ObjectRef)]) -> CompgraphResult<()> {
    for (name, r) in v {
        *r = f(&Role::Parameter(name.clone()), *r)?;
    }
    Ok(())
}

impl ObjectBody {
    /// Kind of this body.
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectBody::ContainerVisual(_) => ObjectKind::ContainerVisual,
            ObjectBody::ShapeVisual(_) => ObjectKind::ShapeVisual,
            ObjectBody::SpriteVisual(_) => ObjectKind::SpriteVisual,
            ObjectBody::LayerVisual(_) => ObjectKind::LayerVisual,
            ObjectBody::ContainerShape(_) => ObjectKind::ContainerShape,
            ObjectBody::SpriteShape(_) => ObjectKind::SpriteShape,
            ObjectBody::EllipseGeometry(_) => ObjectKind::EllipseGeometry,
            ObjectBody::RectangleGeometry(_) => ObjectKind::RectangleGeometry,
            ObjectBody::RoundedRectangleGeometry(_) => ObjectKind::RoundedRectangleGeometry,
            ObjectBody::PathGeometry(_) => ObjectKind::PathGeometry,
            ObjectBody::CompositionPath(_) => ObjectKind::CompositionPath,
            ObjectBody::PathData(_) => ObjectKind::PathData,
            ObjectBody::ColorBrush(_) => ObjectKind::ColorBrush,
            ObjectBody::LinearGradientBrush(_) => ObjectKind::LinearGradientBrush,
            ObjectBody::RadialGradientBrush(_) => ObjectKind::RadialGradientBrush,
            ObjectBody::ColorGradientStop(_) => ObjectKind::ColorGradientStop,
            ObjectBody::SurfaceBrush(_) => ObjectKind::SurfaceBrush,
            ObjectBody::EffectBrush(_) => ObjectKind::EffectBrush,
            ObjectBody::GaussianBlurEffect(_) => ObjectKind::GaussianBlurEffect,
            ObjectBody::CompositeEffect(_) => ObjectKind::CompositeEffect,
            ObjectBody::DropShadow(_) => ObjectKind::DropShadow,
            ObjectBody::LoadedImageSurface(_) => ObjectKind::LoadedImageSurface,
            ObjectBody::VisualSurface(_) => ObjectKind::VisualSurface,
            ObjectBody::InsetClip(_) => ObjectKind::InsetClip,
            ObjectBody::GeometricClip(_) => ObjectKind::GeometricClip,
            ObjectBody::ViewBox(_) => ObjectKind::ViewBox,
            ObjectBody::LinearEasing => ObjectKind::LinearEasing,
            ObjectBody::CubicBezierEasing(_) => ObjectKind::CubicBezierEasing,
            ObjectBody::StepEasing(_) => ObjectKind::StepEasing,
            ObjectBody::KeyFrameAnimation(a) => match a.value_type {
                KeyFrameType::Boolean => ObjectKind::BooleanKeyFrameAnimation,
                KeyFrameType::Color => ObjectKind::ColorKeyFrameAnimation,
                KeyFrameType::Path => ObjectKind::PathKeyFrameAnimation,
                KeyFrameType::Scalar => ObjectKind::ScalarKeyFrameAnimation,
                KeyFrameType::Vector2 => ObjectKind::Vector2KeyFrameAnimation,
                KeyFrameType::Vector3 => ObjectKind::Vector3KeyFrameAnimation,
                KeyFrameType::Vector4 => ObjectKind::Vector4KeyFrameAnimation,
            },
            ObjectBody::ExpressionAnimation(_) => ObjectKind::ExpressionAnimation,
            ObjectBody::PropertySet(_) => ObjectKind::PropertySet,
            ObjectBody::AnimationController(_) => ObjectKind::AnimationController,
        }
    }

    /// Non-owning back-reference of owned sub-objects (owned property sets, controllers).
    pub fn owner(&self) -> Option<ObjectRef> {
        match self {
            ObjectBody::PropertySet(p) => p.owner,
            ObjectBody::AnimationController(c) => Some(c.target),
            _ => None,
        }
    }

    /// `true` for owned property sets and controllers.
    pub fn is_owned(&self) -> bool {
        self.owner().is_some()
    }

    /// Children of container kinds.
    pub fn container_children(&self) -> Option<&[ObjectRef]> {
        match self {
            ObjectBody::ContainerVisual(v) => Some(&v.children),
            ObjectBody::ContainerShape(s) => Some(&s.shapes),
            _ => None,
        }
    }

    /// Mutable children of container kinds.
    pub fn container_children_mut(&mut self) -> Option<&mut Vec<ObjectRef>> {
        match self {
            ObjectBody::ContainerVisual(v) => Some(&mut v.children),
            ObjectBody::ContainerShape(s) => Some(&mut s.shapes),
            _ => None,
        }
    }

    /// `true` when a container's own properties are all at their target-API defaults.
    ///
    /// Non-container kinds report `false`.
    pub fn has_default_container_props(&self) -> bool {
        match self {
            ObjectBody::ContainerVisual(v) => v.props == VisualProps::default(),
            ObjectBody::ContainerShape(s) => s.props == ShapeProps::default(),
            _ => false,
        }
    }

    /// Visit every outgoing reference held by the body, in field order.
    ///
    /// Back-references of owned sub-objects (`PropertySet::owner`,
    /// `AnimationController::target`) are not references in this sense and are not visited.
    pub fn for_each_ref(&self, mut out: impl FnMut(Role, ObjectRef)) {
        let out = &mut out;
        match self {
            ObjectBody::ContainerVisual(v) => {
                opt_ref(out, "Clip", &v.props.clip);
                list_refs(out, "Children", &v.children);
            }
            ObjectBody::ShapeVisual(v) => {
                opt_ref(out, "Clip", &v.props.clip);
                opt_ref(out, "ViewBox", &v.view_box);
                list_refs(out, "Shapes", &v.shapes);
            }
            ObjectBody::SpriteVisual(v) => {
                opt_ref(out, "Clip", &v.props.clip);
                opt_ref(out, "Brush", &v.brush);
                opt_ref(out, "Shadow", &v.shadow);
            }
            ObjectBody::LayerVisual(v) => {
                opt_ref(out, "Clip", &v.props.clip);
                opt_ref(out, "Effect", &v.effect);
                opt_ref(out, "Shadow", &v.shadow);
                list_refs(out, "Children", &v.children);
            }
            ObjectBody::ContainerShape(s) => list_refs(out, "Shapes", &s.shapes),
            ObjectBody::SpriteShape(s) => {
                opt_ref(out, "Geometry", &s.geometry);
                opt_ref(out, "FillBrush", &s.fill_brush);
                opt_ref(out, "StrokeBrush", &s.stroke_brush);
            }
            ObjectBody::PathGeometry(g) => opt_ref(out, "Path", &g.path),
            ObjectBody::CompositionPath(p) => out(Role::Slot("Source"), p.source),
            ObjectBody::LinearGradientBrush(b) => list_refs(out, "Stops", &b.gradient.stops),
            ObjectBody::RadialGradientBrush(b) => list_refs(out, "Stops", &b.gradient.stops),
            ObjectBody::SurfaceBrush(b) => opt_ref(out, "Surface", &b.surface),
            ObjectBody::EffectBrush(b) => {
                out(Role::Slot("Effect"), b.effect);
                param_refs(out, &b.sources);
            }
            ObjectBody::DropShadow(d) => opt_ref(out, "Mask", &d.mask),
            ObjectBody::VisualSurface(s) => opt_ref(out, "SourceVisual", &s.source_visual),
            ObjectBody::GeometricClip(c) => opt_ref(out, "Geometry", &c.geometry),
            ObjectBody::KeyFrameAnimation(a) => {
                for kf in &a.key_frames {
                    if let KeyFrameValue::Path(p) = &kf.value {
                        out(Role::Item("KeyFramePath"), *p);
                    }
                    if let Some(e) = kf.easing {
                        out(Role::Item("KeyFrameEasing"), e);
                    }
                }
                param_refs(out, &a.reference_parameters);
            }
            ObjectBody::ExpressionAnimation(a) => param_refs(out, &a.reference_parameters),
            ObjectBody::EllipseGeometry(_)
            | ObjectBody::RectangleGeometry(_)
            | ObjectBody::RoundedRectangleGeometry(_)
            | ObjectBody::PathData(_)
            | ObjectBody::ColorBrush(_)
            | ObjectBody::ColorGradientStop(_)
            | ObjectBody::GaussianBlurEffect(_)
            | ObjectBody::CompositeEffect(_)
            | ObjectBody::LoadedImageSurface(_)
            | ObjectBody::InsetClip(_)
            | ObjectBody::ViewBox(_)
            | ObjectBody::LinearEasing
            | ObjectBody::CubicBezierEasing(_)
            | ObjectBody::StepEasing(_)
            | ObjectBody::PropertySet(_)
            | ObjectBody::AnimationController(_) => {}
        }
    }

    /// Rewrite every outgoing reference in the same order [`Self::for_each_ref`] visits them.
    pub fn try_map_refs(&mut self, f: &mut RefMapper<'_>) -> CompgraphResult<()> {
        match self {
            ObjectBody::ContainerVisual(v) => {
                map_opt(f, "Clip", &mut v.props.clip)?;
                map_list(f, "Children", &mut v.children)?;
            }
            ObjectBody::ShapeVisual(v) => {
                map_opt(f, "Clip", &mut v.props.clip)?;
                map_opt(f, "ViewBox", &mut v.view_box)?;
                map_list(f, "Shapes", &mut v.shapes)?;
            }
            ObjectBody::SpriteVisual(v) => {
                map_opt(f, "Clip", &mut v.props.clip)?;
                map_opt(f, "Brush", &mut v.brush)?;
                map_opt(f, "Shadow", &mut v.shadow)?;
            }
            ObjectBody::LayerVisual(v) => {
                map_opt(f, "Clip", &mut v.props.clip)?;
                map_opt(f, "Effect", &mut v.effect)?;
                map_opt(f, "Shadow", &mut v.shadow)?;
                map_list(f, "Children", &mut v.children)?;
            }
            ObjectBody::ContainerShape(s) => map_list(f, "Shapes", &mut s.shapes)?,
            ObjectBody::SpriteShape(s) => {
                map_opt(f, "Geometry", &mut s.geometry)?;
                map_opt(f, "FillBrush", &mut s.fill_brush)?;
                map_opt(f, "StrokeBrush", &mut s.stroke_brush)?;
            }
            ObjectBody::PathGeometry(g) => map_opt(f, "Path", &mut g.path)?,
            ObjectBody::CompositionPath(p) => p.source = f(&Role::Slot("Source"), p.source)?,
            ObjectBody::LinearGradientBrush(b) => map_list(f, "Stops", &mut b.gradient.stops)?,
            ObjectBody::RadialGradientBrush(b) => map_list(f, "Stops", &mut b.gradient.stops)?,
            ObjectBody::SurfaceBrush(b) => map_opt(f, "Surface", &mut b.surface)?,
            ObjectBody::EffectBrush(b) => {
                b.effect = f(&Role::Slot("Effect"), b.effect)?;
                map_params(f, &mut b.sources)?;
            }
            ObjectBody::DropShadow(d) => map_opt(f, "Mask", &mut d.mask)?,
            ObjectBody::VisualSurface(s) => map_opt(f, "SourceVisual", &mut s.source_visual)?,
            ObjectBody::GeometricClip(c) => map_opt(f, "Geometry", &mut c.geometry)?,
            ObjectBody::KeyFrameAnimation(a) => {
                for kf in &mut a.key_frames {
                    if let KeyFrameValue::Path(p) = &mut kf.value {
                        *p = f(&Role::Item("KeyFramePath"), *p)?;
                    }
                    if let Some(e) = kf.easing.as_mut() {
                        *e = f(&Role::Item("KeyFrameEasing"), *e)?;
                    }
                }
                map_params(f, &mut a.reference_parameters)?;
            }
            ObjectBody::ExpressionAnimation(a) => map_params(f, &mut a.reference_parameters)?,
            ObjectBody::EllipseGeometry(_)
            | ObjectBody::RectangleGeometry(_)
            | ObjectBody::RoundedRectangleGeometry(_)
            | ObjectBody::PathData(_)
            | ObjectBody::ColorBrush(_)
            | ObjectBody::ColorGradientStop(_)
            | ObjectBody::GaussianBlurEffect(_)
            | ObjectBody::CompositeEffect(_)
            | ObjectBody::LoadedImageSurface(_)
            | ObjectBody::InsetClip(_)
            | ObjectBody::ViewBox(_)
            | ObjectBody::LinearEasing
            | ObjectBody::CubicBezierEasing(_)
            | ObjectBody::StepEasing(_)
            | ObjectBody::PropertySet(_)
            | ObjectBody::AnimationController(_) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
