//! Transport store for finished strokes.
//!
//! Lines live under `rooms/{room}/playground/{play}/lines`. The core only
//! appends to and reads from that collection; connection handling and
//! ordering belong to the store implementation.

mod memory;

pub use memory::MemoryLineStore;

use crate::stroke::{MalformedStrokeError, StrokeRecord};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Store error: {0}")]
    Other(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Collections making up the document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionName {
    Rooms,
    Playground,
    Lines,
}

impl CollectionName {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionName::Rooms => "rooms",
            CollectionName::Playground => "playground",
            CollectionName::Lines => "lines",
        }
    }
}

/// Path of the play document inside a room.
pub fn play_path(room_id: &str, play_id: &str) -> String {
    format!(
        "{}/{room_id}/{}/{play_id}",
        CollectionName::Rooms.as_str(),
        CollectionName::Playground.as_str()
    )
}

/// Path of the line collection of a play.
pub fn lines_path(room_id: &str, play_id: &str) -> String {
    format!("{}/{}", play_path(room_id, play_id), CollectionName::Lines.as_str())
}

/// Who drew a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub player_name: String,
}

/// A persisted line: author fields plus the record as a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineDocument {
    /// Author id.
    pub id: String,
    /// Author display name.
    pub player: String,
    /// JSON-encoded [`StrokeRecord`].
    pub line: String,
    /// Assigned by the store when the document is written.
    #[serde(rename = "createAt", default, skip_serializing_if = "Option::is_none")]
    pub create_at: Option<u64>,
}

impl LineDocument {
    pub fn new(author: Option<&Author>, record: &StrokeRecord) -> StoreResult<Self> {
        let line = record
            .to_json()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self {
            id: author.map(|a| a.id.clone()).unwrap_or_default(),
            player: author.map(|a| a.player_name.clone()).unwrap_or_default(),
            line,
            create_at: None,
        })
    }

    /// Parse the embedded record.
    pub fn record(&self) -> Result<StrokeRecord, MalformedStrokeError> {
        StrokeRecord::from_json(&self.line)
    }
}

/// Trait for line store backends.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait LineStore: Send + Sync {
    /// Check whether the play document exists.
    fn play_exists(&self, room_id: &str, play_id: &str) -> BoxFuture<'_, StoreResult<bool>>;

    /// Append a line to the play's line collection.
    fn add_line(&self, room_id: &str, play_id: &str, line: LineDocument) -> BoxFuture<'_, StoreResult<()>>;

    /// Read every line of a play in write order.
    fn lines(&self, room_id: &str, play_id: &str) -> BoxFuture<'_, StoreResult<Vec<LineDocument>>>;
}

/// Trait for line store backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait LineStore {
    /// Check whether the play document exists.
    fn play_exists(&self, room_id: &str, play_id: &str) -> BoxFuture<'_, StoreResult<bool>>;

    /// Append a line to the play's line collection.
    fn add_line(&self, room_id: &str, play_id: &str, line: LineDocument) -> BoxFuture<'_, StoreResult<()>>;

    /// Read every line of a play in write order.
    fn lines(&self, room_id: &str, play_id: &str) -> BoxFuture<'_, StoreResult<Vec<LineDocument>>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{LineStyle, Stroke};
    use kurbo::Point;

    #[test]
    fn test_lines_path() {
        assert_eq!(lines_path("r1", "p1"), "rooms/r1/playground/p1/lines");
    }

    #[test]
    fn test_document_wraps_record() {
        let mut stroke = Stroke::begin(Some(Point::ZERO), LineStyle::default());
        stroke.append(Point::new(2.0, 2.0));
        let author = Author {
            id: "u1".into(),
            player_name: "alice".into(),
        };

        let doc = LineDocument::new(Some(&author), &stroke.to_record()).unwrap();
        assert_eq!(doc.id, "u1");
        assert_eq!(doc.player, "alice");
        assert_eq!(doc.record().unwrap(), stroke.to_record());

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["line"].is_string());
        assert!(json.get("createAt").is_none());
    }
}
