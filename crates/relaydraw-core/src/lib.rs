//! RelayDraw Core Library
//!
//! Platform-agnostic stroke capture, transport records and paced replay for
//! turn-based collaborative drawing. Rendering, image loading and storage
//! are supplied by the host through traits.

pub mod config;
pub mod image;
pub mod input;
pub mod palette;
pub mod render;
pub mod replay;
pub mod scale;
pub mod session;
pub mod store;
pub mod stroke;
pub mod surface;

pub use config::{CanvasConfig, ConfigError};
pub use image::{BackgroundImage, ImageLoadError, ImageLoader, StaticImageLoader};
pub use input::{InputMachine, PointerEvent, PointerEventKind};
pub use palette::UserColor;
pub use render::{HeadlessContainer, HeadlessRenderer, Layer, PolylineId, RenderLog, RenderOp, Renderer};
pub use replay::{ReplayId, ReplayPhase, ReplayScheduler};
pub use scale::{ViewScale, normalize};
pub use session::{DrawStatus, PostOutcome, Session, SessionError, SessionState};
pub use store::{Author, LineDocument, LineStore, MemoryLineStore, StoreError, lines_path};
pub use stroke::{CompositeOperation, CssColor, LineCap, LineStyle, MalformedStrokeError, Stroke, StrokeRecord};
pub use surface::{Container, ScrollLock, Subscription, Surface};
