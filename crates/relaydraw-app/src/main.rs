//! Headless application entry point.
//!
//! Plays one round without a display: a drawer traces a stroke and posts
//! it, then a viewer reads the play back and replays every line in real
//! time. Usage: `relaydraw [config.json]`.

use kurbo::{Point, Size, Vec2};
use relaydraw_core::{
    Author, CanvasConfig, ConfigError, DrawStatus, HeadlessContainer, HeadlessRenderer, LineStore,
    MemoryLineStore, PointerEvent, Session, SessionError, StaticImageLoader, StoreError, UserColor,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

const ROOM_ID: &str = "demo-room";
const PLAY_ID: &str = "round-1";
const STAGE_SIZE: Size = Size::new(800.0, 600.0);

#[derive(Debug, Error)]
enum AppError {
    #[error("Failed to read config {path}: {source}")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn main() {
    env_logger::init();
    log::info!("Starting RelayDraw");

    if let Err(e) = pollster::block_on(run()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config() -> Result<CanvasConfig, AppError> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).map_err(|source| AppError::ReadConfig {
                path: path.clone(),
                source,
            })?;
            Ok(CanvasConfig::from_json(&json)?)
        }
        None => Ok(CanvasConfig::default()),
    }
}

/// A loop of stage pixels, as a pointer on a 2x display would report it.
fn scripted_gesture() -> Vec<Point> {
    (0..=48)
        .map(|i| {
            let t = f64::from(i) / 48.0 * std::f64::consts::TAU;
            let r = 200.0 + 60.0 * (3.0 * t).sin();
            Point::new(800.0 + r * t.cos(), 600.0 + r * t.sin())
        })
        .collect()
}

async fn run() -> Result<(), AppError> {
    let config = load_config()?;
    let store = Arc::new(MemoryLineStore::new());
    store.create_play(ROOM_ID, PLAY_ID)?;
    let images = Arc::new(StaticImageLoader::new().with_image(config.background_src.clone(), 800, 600));

    // Drawer: HiDPI stage, so every pointer position is halved.
    let drawer_box = HeadlessContainer::new(STAGE_SIZE).with_scale(Vec2::new(2.0, 2.0));
    let mut drawer: Session<HeadlessRenderer> =
        Session::new(config.clone(), store.clone(), images.clone()).with_author(Author {
            id: "player-1".to_string(),
            player_name: "Drawer".to_string(),
        });
    let drawer_color = UserColor::for_seat(1);
    log::info!("Drawer takes seat 1 ({})", drawer_color.name());
    drawer.mount(&drawer_box, drawer_color.hex()).await?;
    drawer.set_draw_status(DrawStatus::Armed);

    let gesture = scripted_gesture();
    if let Some((&first, rest)) = gesture.split_first() {
        drawer.handle_pointer_event(PointerEvent::Down { position: first });
        for &position in rest {
            drawer.handle_pointer_event(PointerEvent::Move { position });
        }
        drawer.handle_pointer_event(PointerEvent::Up { position: first });
    }
    log::info!("Drawer status after gesture: {:?}", drawer.draw_status());

    let outcome = drawer.post_line(ROOM_ID, PLAY_ID).await?;
    log::info!("Post outcome: {:?}", outcome);
    drawer.unmount();

    // Viewer: replays everything posted to the play.
    let viewer_box = HeadlessContainer::new(STAGE_SIZE);
    let mut viewer: Session<HeadlessRenderer> = Session::new(config, store.clone(), images);
    viewer.mount(&viewer_box, UserColor::for_seat(0).hex()).await?;

    let lines = store.lines(ROOM_ID, PLAY_ID).await?;
    for line in &lines {
        if let Err(e) = viewer.load_document(line) {
            log::warn!("Skipping line from {}: {}", line.player, e);
        }
    }

    let started = Instant::now();
    let mut last = started;
    while let Some(wait) = viewer.next_deadline() {
        std::thread::sleep(wait);
        let now = Instant::now();
        viewer.advance(now - last);
        last = now;
    }

    log::info!(
        "Replayed {} of {} lines in {:?} ({} repaint requests)",
        viewer.loaded_turn(),
        lines.len(),
        started.elapsed(),
        viewer_box.log().repaint_count()
    );
    viewer.unmount();
    Ok(())
}
