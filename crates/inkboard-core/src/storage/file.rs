//! File-based storage: one JSON record per canvas.

use super::{
    BoxFuture, CanvasRecord, CanvasSummary, NewCanvas, Storage, StorageError, StorageResult,
    sort_summaries,
};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores canvas records as JSON files in a directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `base_path`, creating the directory
    /// if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// File storage in the configured data directory.
    pub fn default_location() -> StorageResult<Self> {
        Self::new(crate::config::data_dir())
    }

    /// Path of the record for `id`. Ids outside `[A-Za-z0-9_-]` are
    /// rejected so that distinct ids never share a file.
    fn record_path(&self, id: &str) -> StorageResult<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::Other(format!("Invalid canvas id: {:?}", id)));
        }
        Ok(self.base_path.join(format!("{}.json", id)))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

fn read_record(path: &Path) -> StorageResult<CanvasRecord> {
    let json = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json).map_err(|e| {
        StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

fn write_record(path: &Path, record: &CanvasRecord) -> StorageResult<()> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    fs::write(path, json)
        .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

impl Storage for FileStorage {
    fn create(&self, canvas: NewCanvas) -> BoxFuture<'_, StorageResult<CanvasRecord>> {
        Box::pin(async move {
            let record = canvas.into_record();
            write_record(&self.record_path(&record.id)?, &record)?;
            Ok(record)
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<CanvasSummary>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut summaries = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_none_or(|e| e != "json") {
                    continue;
                }
                match read_record(&path) {
                    Ok(record) => summaries.push(record.summary()),
                    Err(e) => log::warn!("skipping unreadable record: {}", e),
                }
            }
            sort_summaries(&mut summaries);
            Ok(summaries)
        })
    }

    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>> {
        let path = self.record_path(id);
        let id = id.to_string();
        Box::pin(async move {
            let path = path?;
            if !path.exists() {
                return Err(StorageError::NotFound(id));
            }
            read_record(&path)
        })
    }

    fn update(&self, id: &str, scene_data: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>> {
        let path = self.record_path(id);
        let id = id.to_string();
        let scene_data = scene_data.to_string();
        Box::pin(async move {
            let path = path?;
            if !path.exists() {
                return Err(StorageError::NotFound(id));
            }
            let mut record = read_record(&path)?;
            record.scene_data = scene_data;
            record.updated_at = Utc::now();
            write_record(&path, &record)?;
            Ok(record)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(id);
        Box::pin(async move {
            let path = path?;
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;
    use tempfile::tempdir;

    fn new_canvas(name: &str) -> NewCanvas {
        NewCanvas {
            name: name.to_string(),
            owner_id: "user-1".to_string(),
            scene_data: r#"{"version":1}"#.to_string(),
        }
    }

    #[test]
    fn test_file_storage_create_get() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let created = block_on(storage.create(new_canvas("Roadmap"))).unwrap();
        let loaded = block_on(storage.get(&created.id)).unwrap();

        assert_eq!(loaded.name, "Roadmap");
        assert_eq!(loaded.scene_data, created.scene_data);
        assert!(dir.path().join(format!("{}.json", created.id)).exists());
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(storage.get("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_update() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let created = block_on(storage.create(new_canvas("Roadmap"))).unwrap();
        block_on(storage.update(&created.id, r#"{"version":1,"objects":[]}"#)).unwrap();

        let loaded = block_on(storage.get(&created.id)).unwrap();
        assert_eq!(loaded.scene_data, r#"{"version":1,"objects":[]}"#);
        assert_eq!(loaded.created_at, created.created_at);
    }

    #[test]
    fn test_file_storage_list_skips_foreign_files() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.create(new_canvas("One"))).unwrap();
        block_on(storage.create(new_canvas("Two"))).unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let list = block_on(storage.list()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().any(|s| s.name == "One"));
    }

    #[test]
    fn test_file_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let created = block_on(storage.create(new_canvas("Roadmap"))).unwrap();
        block_on(storage.delete(&created.id)).unwrap();
        assert!(matches!(
            block_on(storage.get(&created.id)),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_file_storage_rejects_malformed_ids() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        for id in ["../escape/attempt", "a.b", "", "caf\u{e9}"] {
            assert!(matches!(block_on(storage.get(id)), Err(StorageError::Other(_))));
            assert!(block_on(storage.delete(id)).is_err());
        }
        assert!(matches!(
            block_on(storage.update("a.b", "{}")),
            Err(StorageError::Other(_))
        ));
    }

    #[test]
    fn test_similar_ids_do_not_share_a_record() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let record = block_on(storage.create(new_canvas("Roadmap"))).unwrap();
        let lookalike = record.id.replace('-', ".");

        assert!(block_on(storage.get(&lookalike)).is_err());
        assert!(block_on(storage.delete(&lookalike)).is_err());
        assert_eq!(block_on(storage.get(&record.id)).unwrap().name, "Roadmap");
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileStorage::new(nested.clone()).unwrap();
        assert_eq!(storage.base_path(), nested.as_path());
        assert!(nested.is_dir());
    }
}
