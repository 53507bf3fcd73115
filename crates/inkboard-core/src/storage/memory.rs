//! In-memory storage implementation.

use super::{
    BoxFuture, CanvasRecord, CanvasSummary, NewCanvas, Storage, StorageError, StorageResult,
    sort_summaries,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, CanvasRecord>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn create(&self, canvas: NewCanvas) -> BoxFuture<'_, StorageResult<CanvasRecord>> {
        Box::pin(async move {
            let record = canvas.into_record();
            let mut records = self.records.write().map_err(lock_error)?;
            records.insert(record.id.clone(), record.clone());
            Ok(record)
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<CanvasSummary>>> {
        Box::pin(async move {
            let records = self.records.read().map_err(lock_error)?;
            let mut summaries: Vec<CanvasSummary> =
                records.values().map(CanvasRecord::summary).collect();
            sort_summaries(&mut summaries);
            Ok(summaries)
        })
    }

    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>> {
        let id = id.to_string();
        Box::pin(async move {
            let records = self.records.read().map_err(lock_error)?;
            records
                .get(&id)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(id))
        })
    }

    fn update(&self, id: &str, scene_data: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>> {
        let id = id.to_string();
        let scene_data = scene_data.to_string();
        Box::pin(async move {
            let mut records = self.records.write().map_err(lock_error)?;
            let record = records
                .get_mut(&id)
                .ok_or_else(|| StorageError::NotFound(id.clone()))?;
            record.scene_data = scene_data;
            record.updated_at = Utc::now();
            Ok(record.clone())
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut records = self.records.write().map_err(lock_error)?;
            records.remove(&id);
            Ok(())
        })
    }
}
