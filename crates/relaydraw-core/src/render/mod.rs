//! Rendering capability consumed by the session.
//!
//! The core never draws pixels itself. It asks a [`Renderer`] to create
//! polylines, replace their point lists and schedule repaints.

mod headless;

pub use headless::{HeadlessContainer, HeadlessRenderer, RenderLog, RenderOp};

use crate::image::BackgroundImage;
use crate::stroke::LineStyle;
use kurbo::{Point, Size, Vec2};

/// Handle to a polyline owned by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolylineId(pub u64);

/// The two layers of a canvas surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Holds the background image.
    Background,
    /// Holds every stroke, local or replayed.
    Drawing,
}

/// Trait for rendering backends bound to one stage.
pub trait Renderer {
    /// Current absolute scale of the stage.
    fn absolute_scale(&self) -> Vec2;

    /// Place an image covering `size` on a layer.
    fn add_image(&mut self, layer: Layer, image: &BackgroundImage, size: Size);

    /// Create a polyline with the given style and initial points.
    fn add_polyline(&mut self, layer: Layer, style: &LineStyle, points: &[Point]) -> PolylineId;

    /// Replace the point list of an existing polyline.
    fn set_points(&mut self, id: PolylineId, points: &[Point]);

    /// Remove a polyline from its layer.
    fn remove_polyline(&mut self, id: PolylineId);

    /// Request a repaint of one layer. Requests may be coalesced.
    fn batch_draw(&mut self, layer: Layer);

    /// Repaint every layer now.
    fn draw(&mut self);

    /// Tear the stage down. No further calls are made afterwards.
    fn destroy(&mut self);
}
