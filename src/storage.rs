use std::fs;
use std::io;
use std::path::PathBuf;
use std::collections::HashMap;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::models::Generation;

/// Completed generations kept in the persisted list, newest first.
pub const COMPLETED_CAP: usize = 20;

const PARAMS_KEY: &str = "ai_art_params";
const COMPLETED_KEY: &str = "generation_history";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")] Io(#[from] io::Error),
    #[error("serialization error: {0}")] Serde(#[from] serde_json::Error),
}

/// The two persisted entries: the current parameter snapshot and the bounded
/// completed-generation list. Loads are tolerant — a missing or malformed
/// entry restores nothing rather than failing; saves report their errors so
/// callers decide whether to surface them.
pub trait StateStore: Send + Sync {
    fn load_current(&self) -> Option<Generation>;
    fn save_current(&self, current: &Generation) -> Result<(), StorageError>;
    fn load_completed(&self) -> Vec<Generation>;
    fn save_completed(&self, completed: &[Generation]) -> Result<(), StorageError>;
}

/// Prepends `generation` and drops anything past the cap.
pub fn push_capped(list: &mut Vec<Generation>, generation: Generation) {
    list.insert(0, generation);
    list.truncate(COMPLETED_CAP);
}

/// Key/value store backed by one JSON file per key.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring malformed entry {}: {}", path.display(), e);
                None
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_string_pretty(value)?;
        fs::write(self.path(key), raw)?;
        Ok(())
    }
}

impl StateStore for JsonFileStore {
    fn load_current(&self) -> Option<Generation> {
        self.load(PARAMS_KEY)
    }

    fn save_current(&self, current: &Generation) -> Result<(), StorageError> {
        self.save(PARAMS_KEY, current)
    }

    fn load_completed(&self) -> Vec<Generation> {
        self.load(COMPLETED_KEY).unwrap_or_default()
    }

    fn save_completed(&self, completed: &[Generation]) -> Result<(), StorageError> {
        self.save(COMPLETED_KEY, completed)
    }
}

/// In-memory store for tests and demos without a data directory.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<&'static str, String>>,
}

impl StateStore for MemoryStore {
    fn load_current(&self) -> Option<Generation> {
        let entries = self.entries.lock();
        let raw = entries.get(PARAMS_KEY)?;
        serde_json::from_str(raw).ok()
    }

    fn save_current(&self, current: &Generation) -> Result<(), StorageError> {
        let raw = serde_json::to_string(current)?;
        self.entries.lock().insert(PARAMS_KEY, raw);
        Ok(())
    }

    fn load_completed(&self) -> Vec<Generation> {
        let entries = self.entries.lock();
        entries
            .get(COMPLETED_KEY)
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    fn save_completed(&self, completed: &[Generation]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(completed)?;
        self.entries.lock().insert(COMPLETED_KEY, raw);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn completed(prompt: &str) -> Generation {
        Generation {
            id: Some(Uuid::new_v4()),
            prompt: prompt.into(),
            timestamp: Some(chrono::Utc::now()),
            preview: Some("https://picsum.photos/200?random=1".into()),
            ..Generation::default()
        }
    }

    #[test]
    fn file_store_round_trips_both_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf());

        let params = Generation { prompt: "castle".into(), ..Generation::default() };
        store.save_current(&params).unwrap();
        assert_eq!(store.load_current(), Some(params));

        let list = vec![completed("a"), completed("b")];
        store.save_completed(&list).unwrap();
        assert_eq!(store.load_completed(), list);
    }

    #[test]
    fn missing_entries_restore_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf());
        assert_eq!(store.load_current(), None);
        assert!(store.load_completed().is_empty());
    }

    #[test]
    fn malformed_entries_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ai_art_params.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("generation_history.json"), "42").unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf());
        assert_eq!(store.load_current(), None);
        assert!(store.load_completed().is_empty());
    }

    #[test]
    fn completed_list_is_capped_newest_first() {
        let mut list = Vec::new();
        for i in 0..21 {
            push_capped(&mut list, completed(&format!("prompt {i}")));
        }
        assert_eq!(list.len(), COMPLETED_CAP);
        assert_eq!(list[0].prompt, "prompt 20");
        assert_eq!(list[COMPLETED_CAP - 1].prompt, "prompt 1");
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::default();
        assert_eq!(store.load_current(), None);
        let params = Generation::default();
        store.save_current(&params).unwrap();
        assert_eq!(store.load_current(), Some(params));
    }
}
