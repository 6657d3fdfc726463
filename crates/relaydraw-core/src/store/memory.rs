//! In-memory line store.

use super::{BoxFuture, LineDocument, LineStore, StoreError, StoreResult, play_path};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory store for testing and single-process games.
#[derive(Default)]
pub struct MemoryLineStore {
    plays: RwLock<HashMap<String, Vec<LineDocument>>>,
    clock: AtomicU64,
}

impl MemoryLineStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty play document so lines can be posted to it.
    pub fn create_play(&self, room_id: &str, play_id: &str) -> StoreResult<()> {
        let mut plays = self
            .plays
            .write()
            .map_err(|e| StoreError::Other(format!("Lock error: {}", e)))?;
        plays.entry(play_path(room_id, play_id)).or_default();
        Ok(())
    }
}

impl LineStore for MemoryLineStore {
    fn play_exists(&self, room_id: &str, play_id: &str) -> BoxFuture<'_, StoreResult<bool>> {
        let path = play_path(room_id, play_id);
        Box::pin(async move {
            let plays = self
                .plays
                .read()
                .map_err(|e| StoreError::Other(format!("Lock error: {}", e)))?;
            Ok(plays.contains_key(&path))
        })
    }

    fn add_line(&self, room_id: &str, play_id: &str, mut line: LineDocument) -> BoxFuture<'_, StoreResult<()>> {
        let path = play_path(room_id, play_id);
        Box::pin(async move {
            let mut plays = self
                .plays
                .write()
                .map_err(|e| StoreError::Other(format!("Lock error: {}", e)))?;
            let lines = plays.get_mut(&path).ok_or(StoreError::NotFound(path))?;
            // Monotonic stand-in for a server timestamp.
            line.create_at = Some(self.clock.fetch_add(1, Ordering::Relaxed) + 1);
            lines.push(line);
            Ok(())
        })
    }

    fn lines(&self, room_id: &str, play_id: &str) -> BoxFuture<'_, StoreResult<Vec<LineDocument>>> {
        let path = play_path(room_id, play_id);
        Box::pin(async move {
            let plays = self
                .plays
                .read()
                .map_err(|e| StoreError::Other(format!("Lock error: {}", e)))?;
            plays
                .get(&path)
                .cloned()
                .ok_or(StoreError::NotFound(path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    fn doc(line: &str) -> LineDocument {
        LineDocument {
            id: "u1".into(),
            player: "alice".into(),
            line: line.into(),
            create_at: None,
        }
    }

    #[test]
    fn test_missing_play() {
        let store = MemoryLineStore::new();
        assert!(!block_on(store.play_exists("room", "play")).unwrap());
        let result = block_on(store.add_line("room", "play", doc("{}")));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_add_and_read_in_order() {
        let store = MemoryLineStore::new();
        store.create_play("room", "play").unwrap();
        assert!(block_on(store.play_exists("room", "play")).unwrap());

        block_on(store.add_line("room", "play", doc("first"))).unwrap();
        block_on(store.add_line("room", "play", doc("second"))).unwrap();

        let lines = block_on(store.lines("room", "play")).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line, "first");
        assert_eq!(lines[1].line, "second");
        assert!(lines[0].create_at < lines[1].create_at);
    }

    #[test]
    fn test_plays_are_isolated() {
        let store = MemoryLineStore::new();
        store.create_play("room", "a").unwrap();
        store.create_play("room", "b").unwrap();
        block_on(store.add_line("room", "a", doc("x"))).unwrap();

        assert_eq!(block_on(store.lines("room", "a")).unwrap().len(), 1);
        assert!(block_on(store.lines("room", "b")).unwrap().is_empty());
    }
}
