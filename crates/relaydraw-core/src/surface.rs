//! Canvas surface and the host container it is mounted into.

use crate::image::BackgroundImage;
use crate::input::PointerEventKind;
use crate::render::{Layer, Renderer};
use crate::scale::ViewScale;
use kurbo::Size;

/// A live pointer-listener binding. Disposed exactly once on unmount.
pub trait Subscription {
    fn dispose(&mut self);
}

/// Page-level scroll capture (wheel and touch-move interception).
pub trait ScrollLock {
    /// Stop the page from scrolling while a gesture is in progress.
    fn suspend(&mut self);
    /// Give scrolling back to the page.
    fn restore(&mut self);
}

/// The host element a session mounts into.
pub trait Container {
    type Renderer: Renderer;

    /// Current client size of the element.
    fn client_size(&self) -> Size;

    /// Create a stage of the given size inside the element.
    fn create_stage(&self, size: Size) -> Self::Renderer;

    /// Bind a pointer listener. Events still reach the session through
    /// [`crate::Session::handle_pointer_event`]; the returned handle only
    /// controls the binding's lifetime.
    fn listen(&self, kind: PointerEventKind) -> Box<dyn Subscription>;

    /// Handle on page scroll capture.
    fn scroll_lock(&self) -> Box<dyn ScrollLock>;
}

/// One mounted stage with its background and drawing layers.
///
/// Every mount builds a new surface with a fresh epoch; replay tasks
/// compare epochs to notice that the surface they started on is gone.
pub struct Surface<R: Renderer> {
    renderer: R,
    size: Size,
    epoch: u64,
    background: Option<BackgroundImage>,
}

impl<R: Renderer> Surface<R> {
    pub fn new(renderer: R, size: Size, epoch: u64) -> Self {
        Self {
            renderer,
            size,
            epoch,
            background: None,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn background(&self) -> Option<&BackgroundImage> {
        self.background.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn scale(&self) -> ViewScale {
        self.renderer.absolute_scale().into()
    }

    /// Stretch the background image over the whole surface.
    pub fn set_background(&mut self, image: BackgroundImage) {
        self.renderer.add_image(Layer::Background, &image, self.size);
        self.background = Some(image);
    }

    pub fn draw(&mut self) {
        self.renderer.draw();
    }

    /// Consume the surface and release the stage.
    pub fn destroy(mut self) {
        self.renderer.destroy();
    }
}
