//! Paced replay of received strokes.
//!
//! A replay renders the first point of a stroke at once and then reveals one
//! more point every `interval`, independent of how fast the stroke was drawn.
//! Nothing here owns a timer: the host moves time forward with
//! [`ReplayScheduler::advance`] and each step re-enqueues its own
//! continuation. Replays are independent and may overlap.

use crate::render::{Layer, PolylineId, Renderer};
use crate::session::SessionState;
use crate::stroke::Stroke;
use crate::surface::Surface;
use kurbo::Point;
use log::{debug, info};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::time::Duration;

/// Identifier of one replay.
pub type ReplayId = u64;

/// Lifecycle of a replay task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPhase {
    /// Waiting for its next deadline.
    Pending,
    /// Revealing a point.
    Stepping,
    /// Every point has been revealed.
    Done,
}

/// Result of running one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// More points remain; schedule another step.
    Continue,
    /// The last point was revealed.
    Completed,
    /// The surface the replay started on is gone.
    Abandoned,
}

/// One stroke being revealed point by point.
#[derive(Debug)]
pub struct ReplayTask {
    id: ReplayId,
    epoch: u64,
    polyline: PolylineId,
    rendered: Vec<Point>,
    queue: VecDeque<Point>,
    phase: ReplayPhase,
}

impl ReplayTask {
    /// Put the stroke's first point on the drawing layer and queue the rest.
    fn start<R: Renderer>(id: ReplayId, stroke: &Stroke, surface: &mut Surface<R>) -> Self {
        let mut queue: VecDeque<Point> = stroke.points().iter().copied().collect();
        let rendered: Vec<Point> = queue.pop_front().into_iter().collect();

        let renderer = surface.renderer_mut();
        let polyline = renderer.add_polyline(Layer::Drawing, stroke.style(), &rendered);
        renderer.batch_draw(Layer::Drawing);

        let phase = if queue.is_empty() {
            ReplayPhase::Done
        } else {
            ReplayPhase::Pending
        };
        Self {
            id,
            epoch: surface.epoch(),
            polyline,
            rendered,
            queue,
            phase,
        }
    }

    pub fn id(&self) -> ReplayId {
        self.id
    }

    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    /// Points revealed so far.
    pub fn rendered(&self) -> &[Point] {
        &self.rendered
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Reveal the next point, unless the surface has gone away.
    fn step<R: Renderer>(&mut self, surface: Option<&mut Surface<R>>) -> StepOutcome {
        let Some(surface) = surface.filter(|s| s.epoch() == self.epoch) else {
            self.phase = ReplayPhase::Done;
            return StepOutcome::Abandoned;
        };
        let Some(point) = self.queue.pop_front() else {
            self.phase = ReplayPhase::Done;
            return StepOutcome::Completed;
        };

        self.phase = ReplayPhase::Stepping;
        self.rendered.push(point);
        let renderer = surface.renderer_mut();
        renderer.set_points(self.polyline, &self.rendered);
        renderer.batch_draw(Layer::Drawing);

        if self.queue.is_empty() {
            self.phase = ReplayPhase::Done;
            StepOutcome::Completed
        } else {
            self.phase = ReplayPhase::Pending;
            StepOutcome::Continue
        }
    }
}

/// Runs replay tasks against a virtual clock.
#[derive(Debug)]
pub struct ReplayScheduler {
    interval: Duration,
    now: Duration,
    next_id: ReplayId,
    next_seq: u64,
    /// (deadline, scheduling order, task)
    queue: BinaryHeap<Reverse<(Duration, u64, ReplayId)>>,
    tasks: HashMap<ReplayId, ReplayTask>,
}

impl ReplayScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            now: Duration::ZERO,
            next_id: 1,
            next_seq: 0,
            queue: BinaryHeap::new(),
            tasks: HashMap::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Virtual time elapsed since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of replays still revealing points.
    pub fn active(&self) -> usize {
        self.tasks.len()
    }

    pub fn task(&self, id: ReplayId) -> Option<&ReplayTask> {
        self.tasks.get(&id)
    }

    /// Time until the next step is due.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue
            .peek()
            .map(|Reverse((due, _, _))| due.saturating_sub(self.now))
    }

    /// Start replaying a stroke. A stroke with at most one point completes
    /// immediately and counts its turn right away.
    pub fn start<R: Renderer>(
        &mut self,
        stroke: &Stroke,
        state: &mut SessionState,
        surface: &mut Surface<R>,
    ) -> ReplayId {
        let id = self.next_id;
        self.next_id += 1;

        let task = ReplayTask::start(id, stroke, surface);
        debug!("Replay {} started for stroke {} ({} queued)", id, stroke.id(), task.remaining());
        if task.phase() == ReplayPhase::Done {
            self.complete(id, state);
            return id;
        }
        self.tasks.insert(id, task);
        self.schedule(id, self.now.saturating_add(self.interval));
        id
    }

    /// Move the clock forward, running every step that falls due on the way.
    ///
    /// Returns how many replays completed.
    pub fn advance<R: Renderer>(
        &mut self,
        elapsed: Duration,
        state: &mut SessionState,
        mut surface: Option<&mut Surface<R>>,
    ) -> usize {
        let target = self.now.saturating_add(elapsed);
        let mut completed = 0;

        while let Some(Reverse((due, _, id))) = self.queue.peek().copied() {
            if due > target {
                break;
            }
            self.queue.pop();
            self.now = due;

            let Some(task) = self.tasks.get_mut(&id) else {
                continue;
            };
            match task.step(surface.as_deref_mut()) {
                StepOutcome::Continue => self.schedule(id, due.saturating_add(self.interval)),
                StepOutcome::Completed => {
                    self.tasks.remove(&id);
                    self.complete(id, state);
                    completed += 1;
                }
                StepOutcome::Abandoned => {
                    self.tasks.remove(&id);
                    debug!("Replay {} abandoned: surface gone", id);
                }
            }
        }

        self.now = target;
        completed
    }

    /// Forget every pending replay without counting turns.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.tasks.clear();
    }

    fn schedule(&mut self, id: ReplayId, due: Duration) {
        self.queue.push(Reverse((due, self.next_seq, id)));
        self.next_seq += 1;
    }

    fn complete(&mut self, id: ReplayId, state: &mut SessionState) {
        state.loaded_turn += 1;
        info!("Replay {} complete, loaded turn {}", id, state.loaded_turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{HeadlessContainer, HeadlessRenderer, RenderLog};
    use crate::surface::Container;
    use crate::stroke::{CompositeOperation, CssColor, LineCap, LineStyle, StrokeRecord};
    use kurbo::Size;

    const TICK: Duration = Duration::from_millis(5);

    fn surface(epoch: u64) -> (RenderLog, Surface<HeadlessRenderer>) {
        let container = HeadlessContainer::new(Size::new(100.0, 100.0));
        let renderer = container.create_stage(Size::new(100.0, 100.0));
        (container.log().clone(), Surface::new(renderer, Size::new(100.0, 100.0), epoch))
    }

    fn stroke(points: &[f64]) -> Stroke {
        let mut stroke = Stroke::begin(None, LineStyle::default());
        for pair in points.chunks_exact(2) {
            stroke.append(Point::new(pair[0], pair[1]));
        }
        stroke
    }

    fn state() -> SessionState {
        SessionState::new(CssColor::default())
    }

    #[test]
    fn test_paced_reveal() {
        let (log, mut surface) = surface(1);
        let mut state = state();
        let mut scheduler = ReplayScheduler::new(TICK);

        let id = scheduler.start(&stroke(&[0.0, 0.0, 10.0, 0.0, 10.0, 10.0]), &mut state, &mut surface);
        let polyline = log.polylines()[0];
        assert_eq!(log.points_of(polyline), Some(vec![Point::new(0.0, 0.0)]));
        assert_eq!(scheduler.next_deadline(), Some(TICK));

        // Not yet due.
        scheduler.advance(Duration::from_millis(4), &mut state, Some(&mut surface));
        assert_eq!(log.points_of(polyline).unwrap().len(), 1);

        scheduler.advance(Duration::from_millis(1), &mut state, Some(&mut surface));
        assert_eq!(
            log.points_of(polyline),
            Some(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)])
        );
        assert_eq!(state.loaded_turn, 0);
        assert_eq!(scheduler.task(id).unwrap().phase(), ReplayPhase::Pending);

        let completed = scheduler.advance(TICK, &mut state, Some(&mut surface));
        assert_eq!(completed, 1);
        assert_eq!(
            log.points_of(polyline),
            Some(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)])
        );
        assert_eq!(state.loaded_turn, 1);
        assert_eq!(scheduler.active(), 0);

        scheduler.advance(TICK * 10, &mut state, Some(&mut surface));
        assert_eq!(state.loaded_turn, 1);
    }

    #[test]
    fn test_repaint_after_every_point() {
        let (log, mut surface) = surface(1);
        let mut state = state();
        let mut scheduler = ReplayScheduler::new(TICK);
        scheduler.start(&stroke(&[0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]), &mut state, &mut surface);
        log.clear();

        scheduler.advance(TICK * 3, &mut state, Some(&mut surface));
        assert_eq!(log.repaint_count(), 3);
        assert_eq!(state.loaded_turn, 1);
    }

    #[test]
    fn test_single_point_completes_immediately() {
        let (_log, mut surface) = surface(1);
        let mut state = state();
        let mut scheduler = ReplayScheduler::new(TICK);
        scheduler.start(&stroke(&[4.0, 4.0]), &mut state, &mut surface);
        assert_eq!(state.loaded_turn, 1);
        assert_eq!(scheduler.active(), 0);
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_overlapping_replays_are_independent() {
        let (log, mut surface) = surface(1);
        let mut state = state();
        let mut scheduler = ReplayScheduler::new(TICK);

        scheduler.start(&stroke(&[0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0]), &mut state, &mut surface);
        scheduler.advance(TICK, &mut state, Some(&mut surface));
        scheduler.start(&stroke(&[0.0, 5.0, 1.0, 5.0]), &mut state, &mut surface);

        scheduler.advance(TICK, &mut state, Some(&mut surface));
        assert_eq!(state.loaded_turn, 1);
        let lines = log.polylines();
        assert_eq!(log.points_of(lines[0]).unwrap().len(), 3);
        assert_eq!(log.points_of(lines[1]).unwrap().len(), 2);

        scheduler.advance(TICK, &mut state, Some(&mut surface));
        assert_eq!(state.loaded_turn, 2);
    }

    #[test]
    fn test_abandoned_when_surface_gone() {
        let (log, mut surface) = surface(1);
        let mut state = state();
        let mut scheduler = ReplayScheduler::new(TICK);
        scheduler.start(&stroke(&[0.0, 0.0, 1.0, 1.0, 2.0, 2.0]), &mut state, &mut surface);
        log.clear();

        scheduler.advance::<HeadlessRenderer>(TICK * 5, &mut state, None);
        assert!(log.is_empty());
        assert_eq!(state.loaded_turn, 0);
        assert_eq!(scheduler.active(), 0);
    }

    #[test]
    fn test_abandoned_on_new_surface() {
        let (_old_log, mut old) = surface(1);
        let (new_log, mut new) = surface(2);
        let mut state = state();
        let mut scheduler = ReplayScheduler::new(TICK);
        scheduler.start(&stroke(&[0.0, 0.0, 1.0, 1.0]), &mut state, &mut old);

        scheduler.advance(TICK, &mut state, Some(&mut new));
        assert!(new_log.ops().iter().all(|op| !matches!(op, crate::render::RenderOp::SetPoints { .. })));
        assert_eq!(state.loaded_turn, 0);
    }

    #[test]
    fn test_advance_to_end_of_time_flushes_everything() {
        let (log, mut surface) = surface(1);
        let mut state = state();
        let mut scheduler = ReplayScheduler::new(TICK);
        scheduler.start(&stroke(&[0.0, 0.0, 1.0, 0.0, 2.0, 0.0]), &mut state, &mut surface);
        scheduler.start(&stroke(&[0.0, 5.0, 1.0, 5.0]), &mut state, &mut surface);

        scheduler.advance(Duration::from_millis(1), &mut state, Some(&mut surface));
        let completed = scheduler.advance(Duration::MAX, &mut state, Some(&mut surface));

        assert_eq!(completed, 2);
        assert_eq!(state.loaded_turn, 2);
        assert_eq!(scheduler.active(), 0);
        assert_eq!(scheduler.next_deadline(), None);
        assert_eq!(log.points_of(log.polylines()[0]).unwrap().len(), 3);

        // The clock is pinned at its maximum; further calls stay quiet.
        assert_eq!(scheduler.advance(TICK, &mut state, Some(&mut surface)), 0);
        assert_eq!(scheduler.now(), Duration::MAX);
    }

    #[test]
    fn test_replay_of_decoded_record() {
        let record = StrokeRecord::from_json(
            r##"{"attrs":{"id":"x","stroke":"#3182CE","strokeWidth":12,"lineCap":"square",
                "globalCompositeOperation":"destination-out","points":[0,0,10,0,10,10]},"className":"Line"}"##,
        )
        .unwrap();
        let stroke = Stroke::from_record(&record).unwrap();
        let (log, mut surface) = surface(1);
        let mut state = state();
        let mut scheduler = ReplayScheduler::new(TICK);
        scheduler.start(&stroke, &mut state, &mut surface);
        scheduler.advance(TICK * 2, &mut state, Some(&mut surface));

        let polyline = log.polylines()[0];
        assert_eq!(log.points_of(polyline).unwrap().len(), 3);
        assert_eq!(state.loaded_turn, 1);

        let (style, color) = log.style_of(polyline).unwrap();
        assert_eq!(style.color.as_str(), "#3182CE");
        assert_eq!(style.width, 12.0);
        assert_eq!(style.cap, LineCap::Square);
        assert_eq!(style.composite, CompositeOperation::DestinationOut);
        let rgba = color.unwrap().to_rgba8();
        assert_eq!((rgba.r, rgba.g, rgba.b), (0x31, 0x82, 0xCE));
    }
}
