//! Storage abstraction for canvas records.

mod file;
mod memory;
mod persistence;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use persistence::{RetryPolicy, SaveScheduler, SaveState, SaveStatus, SaveTrigger};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Canvas not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async storage calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A stored canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasRecord {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    /// Serialized scene JSON.
    pub scene_data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CanvasRecord {
    pub fn summary(&self) -> CanvasSummary {
        CanvasSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Listing entry for a stored canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSummary {
    pub id: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

/// Input of [`Storage::create`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCanvas {
    pub name: String,
    pub owner_id: String,
    pub scene_data: String,
}

impl NewCanvas {
    fn into_record(self) -> CanvasRecord {
        let now = Utc::now();
        CanvasRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            owner_id: self.owner_id,
            scene_data: self.scene_data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Backend for canvas records.
///
/// Implementations can keep records in memory, on the filesystem or behind
/// a remote API. Ids are assigned by the backend on create.
pub trait Storage: Send + Sync {
    /// Store a new canvas and return its record.
    fn create(&self, canvas: NewCanvas) -> BoxFuture<'_, StorageResult<CanvasRecord>>;

    /// List stored canvases, most recently updated first.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<CanvasSummary>>>;

    /// Load a canvas.
    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>>;

    /// Replace a canvas's scene data.
    fn update(&self, id: &str, scene_data: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>>;

    /// Delete a canvas.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;
}

fn sort_summaries(summaries: &mut [CanvasSummary]) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
}

/// Minimal executor for storage futures in tests.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);
    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return output;
        }
    }
}
