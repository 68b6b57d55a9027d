use crate::foundation::error::{CompgraphError, CompgraphResult};

pub use kurbo::{Affine, BezPath, PathEl, Point, Vec2};

/// 3D vector used by visual offsets, scales and center points.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vector3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vector3 {
    /// Construct a vector from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// 4D vector used by vector4 animations and property values.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vector4 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
    /// W component.
    pub w: f64,
}

/// Straight-alpha ARGB8 color, the form the target object API takes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Color {
    /// Alpha channel.
    pub a: u8,
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Construct an ARGB color.
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::argb(0xff, r, g, b)
    }

    /// Parse `#AARRGGBB` or `#RRGGBB`.
    pub fn from_hex(s: &str) -> CompgraphResult<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        let parse = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| CompgraphError::validation(format!("invalid color literal {s:?}")))
        };
        match digits.len() {
            6 if digits.is_ascii() => Ok(Self::rgb(parse(0)?, parse(2)?, parse(4)?)),
            8 if digits.is_ascii() => Ok(Self::argb(parse(0)?, parse(2)?, parse(4)?, parse(6)?)),
            _ => Err(CompgraphError::validation(format!(
                "invalid color literal {s:?}"
            ))),
        }
    }

    /// `AARRGGBB` upper-case hex, used in generated names.
    pub fn hex(self) -> String {
        format!("{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }
}

/// Animation duration in 100ns ticks, matching the target API's time span unit.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Ticks(pub i64);

impl Ticks {
    /// Ticks per second.
    pub const PER_SECOND: i64 = 10_000_000;

    /// Convert whole milliseconds to ticks.
    pub fn from_millis(ms: i64) -> Self {
        Self(ms.saturating_mul(Self::PER_SECOND / 1000))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
