//! Conversion from pointer coordinates to canvas coordinates.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Absolute scale of the stage at the time a pointer event is read.
///
/// Pointer positions arrive in stage pixels; strokes are stored in canvas
/// units, so every captured point is divided by the current scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewScale {
    pub sx: f64,
    pub sy: f64,
}

impl Default for ViewScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewScale {
    pub const IDENTITY: ViewScale = ViewScale { sx: 1.0, sy: 1.0 };

    pub fn new(sx: f64, sy: f64) -> Self {
        Self { sx, sy }
    }

    /// Transform from stage pixels to canvas units.
    ///
    /// Callers guarantee both factors are strictly positive.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale_non_uniform(1.0 / self.sx, 1.0 / self.sy)
    }

    /// Convert a raw pointer position into canvas space.
    pub fn normalize(&self, raw: Point) -> Point {
        self.inverse_transform() * raw
    }
}

impl From<Vec2> for ViewScale {
    fn from(v: Vec2) -> Self {
        Self { sx: v.x, sy: v.y }
    }
}

/// Shorthand for `ViewScale::from(scale).normalize(raw)`.
pub fn normalize(raw: Point, scale: Vec2) -> Point {
    ViewScale::from(scale).normalize(raw)
}
