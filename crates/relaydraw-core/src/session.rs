//! Session state and the mount/unmount lifecycle.
//!
//! A [`Session`] is the whole public surface other parts of an application
//! depend on: four observable properties (`draw_status`, `loaded_turn`,
//! `is_drawing`, `line_color`) and the operations `mount`, `post_line` and
//! `load_line`, plus the plumbing a host needs to feed it pointer events
//! and time.
//!
//! Container listeners only scope the binding: the host forwards every
//! pointer event it receives to [`Session::handle_pointer_event`] and calls
//! [`Session::advance`] as time passes.

use crate::config::CanvasConfig;
use crate::image::{ImageLoadError, ImageLoader};
use crate::input::{InputMachine, PointerEvent};
use crate::render::Renderer;
use crate::replay::{ReplayId, ReplayScheduler};
use crate::store::{Author, LineDocument, LineStore, StoreError};
use crate::stroke::{CssColor, MalformedStrokeError, Stroke, StrokeRecord};
use crate::surface::{Container, Surface};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Malformed stroke: {0}")]
    MalformedStroke(#[from] MalformedStrokeError),
    #[error("Background image failed to load: {0}")]
    ImageLoad(#[from] ImageLoadError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Where the local player is in their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawStatus {
    /// Not this player's turn.
    #[default]
    #[serde(rename = "stop")]
    Idle,
    /// The player may draw one stroke.
    #[serde(rename = "start")]
    Armed,
    /// A stroke has been drawn and is ready to post.
    #[serde(rename = "finish")]
    Finished,
}

/// Observable session fields.
///
/// `is_drawing` is only true while `draw_status` is `Armed` and a stroke is
/// open. `loaded_turn` never decreases within a mount.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub(crate) draw_status: DrawStatus,
    pub(crate) is_drawing: bool,
    pub(crate) loaded_turn: u64,
    pub(crate) line_color: CssColor,
}

impl SessionState {
    pub fn new(line_color: CssColor) -> Self {
        Self {
            draw_status: DrawStatus::Idle,
            is_drawing: false,
            loaded_turn: 0,
            line_color,
        }
    }

    pub fn draw_status(&self) -> DrawStatus {
        self.draw_status
    }

    pub fn is_drawing(&self) -> bool {
        self.is_drawing
    }

    pub fn loaded_turn(&self) -> u64 {
        self.loaded_turn
    }

    pub fn line_color(&self) -> &CssColor {
        &self.line_color
    }
}

/// What `post_line` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// The finished stroke was written to the store.
    Posted,
    /// No stroke has been finished since the last mount or the last new gesture.
    NothingToPost,
    /// The play document does not exist; nothing was written.
    PlayMissing,
}

/// One player's drawing canvas.
pub struct Session<R: Renderer> {
    config: CanvasConfig,
    state: SessionState,
    surface: Option<Surface<R>>,
    input: InputMachine,
    replay: ReplayScheduler,
    store: Arc<dyn LineStore>,
    images: Arc<dyn ImageLoader>,
    author: Option<Author>,
    epoch: u64,
}

impl<R: Renderer> Session<R> {
    pub fn new(config: CanvasConfig, store: Arc<dyn LineStore>, images: Arc<dyn ImageLoader>) -> Self {
        Self {
            state: SessionState::new(config.default_line_color.clone()),
            input: InputMachine::new(config.line_style()),
            replay: ReplayScheduler::new(config.replay_interval()),
            surface: None,
            store,
            images,
            author: None,
            epoch: 0,
            config,
        }
    }

    /// Attribute posted lines to this author.
    pub fn with_author(mut self, author: Author) -> Self {
        self.author = Some(author);
        self
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn draw_status(&self) -> DrawStatus {
        self.state.draw_status
    }

    /// Change the turn status. Leaving `Armed` mid-gesture drops the open stroke.
    pub fn set_draw_status(&mut self, status: DrawStatus) {
        if status != DrawStatus::Armed && self.state.is_drawing {
            self.input.abort(&mut self.state, self.surface.as_mut());
        }
        debug!("Draw status {:?} -> {:?}", self.state.draw_status, status);
        self.state.draw_status = status;
    }

    pub fn loaded_turn(&self) -> u64 {
        self.state.loaded_turn
    }

    pub fn is_drawing(&self) -> bool {
        self.state.is_drawing
    }

    pub fn line_color(&self) -> &CssColor {
        &self.state.line_color
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&Surface<R>> {
        self.surface.as_ref()
    }

    /// The last finalized local stroke, if it has not been superseded.
    pub fn finished_stroke(&self) -> Option<&Stroke> {
        self.input.finished_stroke()
    }

    pub fn replay(&self) -> &ReplayScheduler {
        &self.replay
    }

    /// Build a fresh surface inside `container`.
    ///
    /// Any previous surface is torn down first. The call completes once the
    /// background image has loaded; if it fails, no surface is left behind.
    pub async fn mount<C>(&mut self, container: &C, color: &str) -> Result<(), SessionError>
    where
        C: Container<Renderer = R>,
    {
        self.unmount();
        self.state = SessionState::new(self.config.default_line_color.clone());
        self.epoch += 1;

        let size = container.client_size();
        let mut renderer = container.create_stage(size);

        let images = Arc::clone(&self.images);
        let image = match images.load(&self.config.background_src).await {
            Ok(image) => image,
            Err(e) => {
                warn!("Mount {} failed: {}", self.epoch, e);
                renderer.destroy();
                return Err(e.into());
            }
        };

        let mut surface = Surface::new(renderer, size, self.epoch);
        surface.set_background(image);
        surface.draw();
        self.surface = Some(surface);
        self.input.bind(container);
        self.state.line_color = CssColor::new(color);

        info!(
            "Mounted surface {} ({}x{}) with colour {}",
            self.epoch, size.width, size.height, color
        );
        Ok(())
    }

    /// Release listeners and the stage. Pending replay steps become no-ops.
    pub fn unmount(&mut self) {
        self.input.unbind();
        self.state.is_drawing = false;
        if let Some(surface) = self.surface.take() {
            info!("Unmounting surface {}", surface.epoch());
            surface.destroy();
        }
    }

    /// Feed one pointer event to the input state machine.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        self.input.handle(&event, &mut self.state, self.surface.as_mut());
    }

    /// Move time forward for replays. Returns how many replays completed.
    pub fn advance(&mut self, elapsed: Duration) -> usize {
        self.replay.advance(elapsed, &mut self.state, self.surface.as_mut())
    }

    /// Time until the next replay step is due, if any replay is running.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.replay.next_deadline()
    }

    /// Persist the last finished stroke under `rooms/{room_id}/playground/{play_id}/lines`.
    pub async fn post_line(&self, room_id: &str, play_id: &str) -> Result<PostOutcome, SessionError> {
        let Some(stroke) = self.input.finished_stroke() else {
            debug!("Nothing to post to {}/{}", room_id, play_id);
            return Ok(PostOutcome::NothingToPost);
        };
        let document = LineDocument::new(self.author.as_ref(), &stroke.to_record())?;

        if !self.store.play_exists(room_id, play_id).await? {
            warn!("Play {}/{} does not exist, line not posted", room_id, play_id);
            return Ok(PostOutcome::PlayMissing);
        }
        self.store.add_line(room_id, play_id, document).await?;
        info!("Posted stroke {} to {}/{}", stroke.id(), room_id, play_id);
        Ok(PostOutcome::Posted)
    }

    /// Start replaying a received record.
    ///
    /// Returns `None` when no surface is mounted. A malformed record fails
    /// without touching the surface or the turn counter.
    pub fn load_line(&mut self, record: &StrokeRecord) -> Result<Option<ReplayId>, SessionError> {
        let stroke = Stroke::from_record(record).inspect_err(|e| warn!("Rejected record: {}", e))?;
        let Some(surface) = self.surface.as_mut() else {
            debug!("Dropping stroke {}: no surface mounted", stroke.id());
            return Ok(None);
        };
        Ok(Some(self.replay.start(&stroke, &mut self.state, surface)))
    }

    /// Start replaying a stored line document.
    pub fn load_document(&mut self, document: &LineDocument) -> Result<Option<ReplayId>, SessionError> {
        let record = document.record()?;
        self.load_line(&record)
    }
}
