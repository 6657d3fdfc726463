//! Pointer gesture handling.
//!
//! Turns pointer down/move/up events into a [`Stroke`] on the drawing layer.
//! Invalid events (wrong status, no surface, no open stroke) are dropped
//! silently: pointer events arrive at high frequency and must never abort
//! the host's input loop.

use crate::render::{Layer, PolylineId, Renderer};
use crate::session::{DrawStatus, SessionState};
use crate::stroke::{LineStyle, Stroke};
use crate::surface::{Container, ScrollLock, Subscription, Surface};
use kurbo::Point;
use log::debug;
use serde::{Deserialize, Serialize};

/// Kinds of pointer events the session listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
}

impl PointerEventKind {
    pub const ALL: [PointerEventKind; 3] = [
        PointerEventKind::Down,
        PointerEventKind::Up,
        PointerEventKind::Move,
    ];
}

/// Pointer event for unified mouse/touch handling, in stage pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
}

impl PointerEvent {
    pub fn kind(&self) -> PointerEventKind {
        match self {
            PointerEvent::Down { .. } => PointerEventKind::Down,
            PointerEvent::Move { .. } => PointerEventKind::Move,
            PointerEvent::Up { .. } => PointerEventKind::Up,
        }
    }

    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position } => position,
        }
    }
}

/// The stroke being drawn and the polyline that shows it.
struct OpenStroke {
    stroke: Stroke,
    polyline: PolylineId,
}

/// Owns the listener bindings and the in-progress gesture of one mount.
pub struct InputMachine {
    base_style: LineStyle,
    subscriptions: Vec<Box<dyn Subscription>>,
    scroll_lock: Option<Box<dyn ScrollLock>>,
    open: Option<OpenStroke>,
    finished: Option<Stroke>,
}

impl InputMachine {
    /// `base_style` is applied to every new stroke with the session colour on top.
    pub fn new(base_style: LineStyle) -> Self {
        Self {
            base_style,
            subscriptions: Vec::new(),
            scroll_lock: None,
            open: None,
            finished: None,
        }
    }

    /// Bind pointer listeners on the container.
    pub fn bind<C: Container>(&mut self, container: &C) {
        self.unbind();
        self.subscriptions = PointerEventKind::ALL
            .into_iter()
            .map(|kind| container.listen(kind))
            .collect();
        self.scroll_lock = Some(container.scroll_lock());
    }

    /// Dispose every binding and drop the open gesture, if any.
    ///
    /// Scroll capture is handed back if a gesture was in progress.
    pub fn unbind(&mut self) {
        for mut subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
        if self.open.take().is_some() {
            self.restore_scroll();
        }
        self.scroll_lock = None;
        self.finished = None;
    }

    pub fn is_bound(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// The stroke currently being drawn.
    pub fn open_stroke(&self) -> Option<&Stroke> {
        self.open.as_ref().map(|open| &open.stroke)
    }

    /// The last stroke that was finalized, until a new one begins.
    pub fn finished_stroke(&self) -> Option<&Stroke> {
        self.finished.as_ref()
    }

    pub fn handle<R: Renderer>(
        &mut self,
        event: &PointerEvent,
        state: &mut SessionState,
        surface: Option<&mut Surface<R>>,
    ) {
        let Some(surface) = surface else {
            debug!("Ignoring {:?}: no surface mounted", event.kind());
            return;
        };
        if state.draw_status != DrawStatus::Armed {
            debug!("Ignoring {:?}: status is {:?}", event.kind(), state.draw_status);
            return;
        }
        match *event {
            PointerEvent::Down { position } => self.pointer_down(position, state, surface),
            PointerEvent::Move { position } => self.pointer_move(position, state, surface),
            PointerEvent::Up { .. } => self.pointer_up(state, surface),
        }
    }

    /// Throw the open gesture away, e.g. when the status leaves `Armed`.
    pub fn abort<R: Renderer>(&mut self, state: &mut SessionState, surface: Option<&mut Surface<R>>) {
        let Some(open) = self.open.take() else {
            return;
        };
        self.restore_scroll();
        state.is_drawing = false;
        if let Some(surface) = surface {
            let renderer = surface.renderer_mut();
            renderer.remove_polyline(open.polyline);
            renderer.batch_draw(Layer::Drawing);
        }
        debug!("Aborted stroke {} with {} points", open.stroke.id(), open.stroke.len());
    }

    fn pointer_down<R: Renderer>(&mut self, position: Point, state: &mut SessionState, surface: &mut Surface<R>) {
        if state.is_drawing || self.open.is_some() {
            return;
        }
        if let Some(lock) = self.scroll_lock.as_mut() {
            lock.suspend();
        }
        state.is_drawing = true;

        let origin = surface.scale().normalize(position);
        let style = self.base_style.clone().with_color(state.line_color.clone());
        let stroke = Stroke::begin(Some(origin), style);

        let renderer = surface.renderer_mut();
        let polyline = renderer.add_polyline(Layer::Drawing, stroke.style(), stroke.points());
        renderer.batch_draw(Layer::Drawing);

        debug!("Began stroke {} at ({}, {})", stroke.id(), origin.x, origin.y);
        self.finished = None;
        self.open = Some(OpenStroke { stroke, polyline });
    }

    fn pointer_move<R: Renderer>(&mut self, position: Point, state: &SessionState, surface: &mut Surface<R>) {
        if !state.is_drawing {
            return;
        }
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let point = surface.scale().normalize(position);
        open.stroke.append(point);

        let renderer = surface.renderer_mut();
        renderer.set_points(open.polyline, open.stroke.points());
        renderer.batch_draw(Layer::Drawing);
    }

    fn pointer_up<R: Renderer>(&mut self, state: &mut SessionState, surface: &mut Surface<R>) {
        if !state.is_drawing {
            return;
        }
        let Some(open) = self.open.take() else {
            return;
        };
        self.restore_scroll();
        state.is_drawing = false;

        if open.stroke.is_degenerate() {
            let renderer = surface.renderer_mut();
            renderer.remove_polyline(open.polyline);
            renderer.batch_draw(Layer::Drawing);
            debug!("Discarded stroke {} with {} points", open.stroke.id(), open.stroke.len());
            return;
        }

        debug!("Finished stroke {} with {} points", open.stroke.id(), open.stroke.len());
        state.draw_status = DrawStatus::Finished;
        self.finished = Some(open.stroke);
    }

    fn restore_scroll(&mut self) {
        if let Some(lock) = self.scroll_lock.as_mut() {
            lock.restore();
        }
    }
}
