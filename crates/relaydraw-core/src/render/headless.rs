//! Headless renderer and container.
//!
//! Nothing is rasterised: every call is appended to a shared [`RenderLog`]
//! so hosts without a display (tests, the CLI shell) can observe what a
//! real backend would have been asked to do.

use super::{Layer, PolylineId, Renderer};
use crate::image::BackgroundImage;
use crate::input::PointerEventKind;
use crate::stroke::LineStyle;
use crate::surface::{Container, ScrollLock, Subscription};
use kurbo::{Point, Size, Vec2};
use peniko::Color;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// One recorded renderer call.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    CreateStage { size: Size },
    AddImage { layer: Layer, src: String, size: Size },
    AddPolyline {
        id: PolylineId,
        layer: Layer,
        style: LineStyle,
        /// `style.color` resolved for painting; `None` when it is not a hex colour.
        color: Option<Color>,
        points: Vec<Point>,
    },
    SetPoints { id: PolylineId, points: Vec<Point> },
    RemovePolyline { id: PolylineId },
    BatchDraw { layer: Layer },
    Draw,
    Destroy,
}

/// Shared, append-only list of renderer calls.
#[derive(Debug, Clone, Default)]
pub struct RenderLog {
    ops: Rc<RefCell<Vec<RenderOp>>>,
}

impl RenderLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, op: RenderOp) {
        self.ops.borrow_mut().push(op);
    }

    /// Snapshot of every call so far.
    pub fn ops(&self) -> Vec<RenderOp> {
        self.ops.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.ops.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.ops.borrow_mut().clear();
    }

    /// Number of repaint requests (batched or immediate).
    pub fn repaint_count(&self) -> usize {
        self.ops
            .borrow()
            .iter()
            .filter(|op| matches!(op, RenderOp::BatchDraw { .. } | RenderOp::Draw))
            .count()
    }

    /// Latest point list seen for a polyline.
    pub fn points_of(&self, id: PolylineId) -> Option<Vec<Point>> {
        self.ops.borrow().iter().rev().find_map(|op| match op {
            RenderOp::SetPoints { id: op_id, points }
            | RenderOp::AddPolyline { id: op_id, points, .. }
                if *op_id == id =>
            {
                Some(points.clone())
            }
            _ => None,
        })
    }

    /// Style a polyline was created with.
    pub fn style_of(&self, id: PolylineId) -> Option<(LineStyle, Option<Color>)> {
        self.ops.borrow().iter().find_map(|op| match op {
            RenderOp::AddPolyline {
                id: op_id,
                style,
                color,
                ..
            } if *op_id == id => Some((style.clone(), *color)),
            _ => None,
        })
    }

    /// Ids of every polyline created so far, in creation order.
    pub fn polylines(&self) -> Vec<PolylineId> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                RenderOp::AddPolyline { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }
}

/// A renderer that records calls instead of drawing.
#[derive(Debug)]
pub struct HeadlessRenderer {
    log: RenderLog,
    scale: Vec2,
    next_id: u64,
    polylines: HashMap<PolylineId, Vec<Point>>,
    destroyed: bool,
}

impl HeadlessRenderer {
    pub fn new(log: RenderLog, size: Size, scale: Vec2) -> Self {
        log.push(RenderOp::CreateStage { size });
        Self {
            log,
            scale,
            next_id: 1,
            polylines: HashMap::new(),
            destroyed: false,
        }
    }

    /// Points currently held by a live polyline.
    pub fn points(&self, id: PolylineId) -> Option<&[Point]> {
        self.polylines.get(&id).map(Vec::as_slice)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Renderer for HeadlessRenderer {
    fn absolute_scale(&self) -> Vec2 {
        self.scale
    }

    fn add_image(&mut self, layer: Layer, image: &BackgroundImage, size: Size) {
        self.log.push(RenderOp::AddImage {
            layer,
            src: image.src.clone(),
            size,
        });
    }

    fn add_polyline(&mut self, layer: Layer, style: &LineStyle, points: &[Point]) -> PolylineId {
        let id = PolylineId(self.next_id);
        self.next_id += 1;
        self.polylines.insert(id, points.to_vec());
        self.log.push(RenderOp::AddPolyline {
            id,
            layer,
            style: style.clone(),
            color: style.color.to_color(),
            points: points.to_vec(),
        });
        id
    }

    fn set_points(&mut self, id: PolylineId, points: &[Point]) {
        if let Some(existing) = self.polylines.get_mut(&id) {
            existing.clear();
            existing.extend_from_slice(points);
        }
        self.log.push(RenderOp::SetPoints {
            id,
            points: points.to_vec(),
        });
    }

    fn remove_polyline(&mut self, id: PolylineId) {
        self.polylines.remove(&id);
        self.log.push(RenderOp::RemovePolyline { id });
    }

    fn batch_draw(&mut self, layer: Layer) {
        self.log.push(RenderOp::BatchDraw { layer });
    }

    fn draw(&mut self) {
        self.log.push(RenderOp::Draw);
    }

    fn destroy(&mut self) {
        self.polylines.clear();
        self.destroyed = true;
        self.log.push(RenderOp::Destroy);
    }
}

struct CountedSubscription {
    active: Rc<Cell<usize>>,
    disposed: bool,
}

impl Subscription for CountedSubscription {
    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.active.set(self.active.get().saturating_sub(1));
        }
    }
}

struct FlagScrollLock {
    suspended: Rc<Cell<bool>>,
}

impl ScrollLock for FlagScrollLock {
    fn suspend(&mut self) {
        self.suspended.set(true);
    }

    fn restore(&mut self) {
        self.suspended.set(false);
    }
}

/// A container with a fixed size that hands out [`HeadlessRenderer`]s.
///
/// Listener and scroll-capture bookkeeping is observable so hosts can check
/// that a session releases everything it acquired.
#[derive(Clone)]
pub struct HeadlessContainer {
    size: Size,
    scale: Vec2,
    log: RenderLog,
    listeners: Rc<Cell<usize>>,
    scroll_suspended: Rc<Cell<bool>>,
}

impl HeadlessContainer {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            scale: Vec2::new(1.0, 1.0),
            log: RenderLog::new(),
            listeners: Rc::new(Cell::new(0)),
            scroll_suspended: Rc::new(Cell::new(false)),
        }
    }

    /// Stage scale reported by renderers created from now on.
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn log(&self) -> &RenderLog {
        &self.log
    }

    /// Pointer listeners currently bound.
    pub fn active_listeners(&self) -> usize {
        self.listeners.get()
    }

    /// Whether page scrolling is currently suppressed.
    pub fn scroll_suspended(&self) -> bool {
        self.scroll_suspended.get()
    }
}

impl Container for HeadlessContainer {
    type Renderer = HeadlessRenderer;

    fn client_size(&self) -> Size {
        self.size
    }

    fn create_stage(&self, size: Size) -> HeadlessRenderer {
        HeadlessRenderer::new(self.log.clone(), size, self.scale)
    }

    fn listen(&self, _kind: PointerEventKind) -> Box<dyn Subscription> {
        self.listeners.set(self.listeners.get() + 1);
        Box::new(CountedSubscription {
            active: Rc::clone(&self.listeners),
            disposed: false,
        })
    }

    fn scroll_lock(&self) -> Box<dyn ScrollLock> {
        Box::new(FlagScrollLock {
            suspended: Rc::clone(&self.scroll_suspended),
        })
    }
}
