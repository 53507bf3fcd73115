//! Open canvases of one user and their persistence.

use crate::canvas::Canvas;
use crate::config::EngineConfig;
use crate::format::{ImportError, NativeBundle, SceneData};
use crate::storage::{
    CanvasRecord, CanvasSummary, NewCanvas, SaveScheduler, SaveState, SaveTrigger, Storage,
    StorageError, StorageResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Workspace errors.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("No canvas is active")]
    NoActiveCanvas,
    #[error("Canvas is not open: {0}")]
    NotOpen(String),
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

struct OpenCanvas {
    name: String,
    canvas: Canvas,
    saver: SaveScheduler,
}

/// Canvases open in this session, one of them active.
///
/// Storage calls are the only async work. Timers are deadlines checked by
/// [`Workspace::tick`].
pub struct Workspace<S: Storage> {
    storage: Arc<S>,
    auth: AuthContext,
    config: EngineConfig,
    open: HashMap<String, OpenCanvas>,
    active: Option<String>,
}

impl<S: Storage> Workspace<S> {
    pub fn new(storage: Arc<S>, auth: AuthContext, config: EngineConfig) -> Self {
        Self {
            storage,
            auth,
            config,
            open: HashMap::new(),
            active: None,
        }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Id of the active canvas.
    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&Canvas> {
        let id = self.active.as_ref()?;
        self.open.get(id).map(|o| &o.canvas)
    }

    /// Name of an open canvas.
    pub fn name(&self, id: &str) -> Option<&str> {
        self.open.get(id).map(|o| o.name.as_str())
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.open.contains_key(id)
    }

    /// Ids of all open canvases, sorted.
    pub fn open_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.open.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn save_state(&self, id: &str) -> Option<&SaveState> {
        self.open.get(id).map(|o| o.saver.state())
    }

    /// Stored canvases.
    pub async fn list(&self) -> WorkspaceResult<Vec<CanvasSummary>> {
        Ok(self.storage.list().await?)
    }

    /// Create an empty canvas owned by the current user and make it active.
    pub async fn create_canvas(&mut self, name: &str, now: Instant) -> WorkspaceResult<String> {
        let canvas = Canvas::new(&self.config);
        self.create_from(name, canvas, now).await
    }

    /// Create a canvas from an exported native bundle and make it active.
    pub async fn import_canvas(
        &mut self,
        name: &str,
        bundle_json: &str,
        now: Instant,
    ) -> WorkspaceResult<String> {
        let bundle = NativeBundle::parse(bundle_json)?;
        let canvas = Canvas::from_scene_data(bundle.scene, &self.config)?;
        self.create_from(name, canvas, now).await
    }

    async fn create_from(
        &mut self,
        name: &str,
        canvas: Canvas,
        now: Instant,
    ) -> WorkspaceResult<String> {
        let scene_data = canvas
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let record = self
            .storage
            .create(NewCanvas {
                name: name.to_string(),
                owner_id: self.auth.user_id.clone(),
                scene_data,
            })
            .await?;
        log::info!("created canvas {} ({})", record.id, record.name);

        self.flush_active(now).await;
        let id = record.id.clone();
        self.insert_open(record, canvas, now);
        self.active = Some(id.clone());
        Ok(id)
    }

    /// Make `id` the active canvas, loading it if it is not open yet.
    ///
    /// The outgoing canvas's debounce is cancelled and its unsaved changes
    /// are flushed with one save before the next canvas is loaded. If the
    /// next canvas cannot be loaded, the outgoing one stays active.
    pub async fn switch_to(&mut self, id: &str, now: Instant) -> WorkspaceResult<()> {
        if self.active.as_deref() == Some(id) {
            return Ok(());
        }
        self.flush_active(now).await;

        if !self.open.contains_key(id) {
            let record = self.storage.get(id).await?;
            let canvas = Canvas::from_json(&record.scene_data, &self.config)?;
            log::info!("opened canvas {} ({})", record.id, record.name);
            self.insert_open(record, canvas, now);
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    fn insert_open(&mut self, record: CanvasRecord, canvas: Canvas, now: Instant) {
        self.open.insert(
            record.id,
            OpenCanvas {
                name: record.name,
                canvas,
                saver: SaveScheduler::new(&self.config, now),
            },
        );
    }

    /// Cancel the active canvas's debounce and save its unsaved changes.
    ///
    /// A failed save stays visible in the canvas's [`SaveState`].
    async fn flush_active(&mut self, now: Instant) {
        let Some(id) = self.active.clone() else {
            return;
        };
        if let Some(entry) = self.open.get_mut(&id) {
            entry.saver.cancel_debounce();
            if entry.saver.is_dirty() {
                let _ = save(self.storage.as_ref(), &id, entry, SaveTrigger::Flush, now).await;
            }
        }
    }

    /// Apply an edit to the active canvas.
    ///
    /// If the edit changed the canvas's history, its debounce restarts.
    pub fn edit<R>(&mut self, now: Instant, f: impl FnOnce(&mut Canvas) -> R) -> WorkspaceResult<R> {
        let id = self.active.as_ref().ok_or(WorkspaceError::NoActiveCanvas)?;
        let entry = self
            .open
            .get_mut(id)
            .ok_or_else(|| WorkspaceError::NotOpen(id.clone()))?;
        let revision = entry.canvas.revision();
        let result = f(&mut entry.canvas);
        if entry.canvas.revision() != revision {
            entry.saver.schedule(now);
        }
        Ok(result)
    }

    /// Fire every save that is due at `now`. Returns the canvases saved.
    pub async fn tick(&mut self, now: Instant) -> Vec<(String, SaveTrigger)> {
        let mut fired = Vec::new();
        for id in self.open_ids() {
            let Some(entry) = self.open.get_mut(&id) else {
                continue;
            };
            if let Some(trigger) = entry.saver.due(now) {
                let _ = save(self.storage.as_ref(), &id, entry, trigger, now).await;
                fired.push((id, trigger));
            }
        }
        fired
    }

    /// Save `id` now if it has unsaved changes.
    ///
    /// Returns false when there was nothing to save. A failed save is
    /// returned as an error and scheduled for retry.
    pub async fn flush(&mut self, id: &str, now: Instant) -> WorkspaceResult<bool> {
        let entry = self
            .open
            .get_mut(id)
            .ok_or_else(|| WorkspaceError::NotOpen(id.to_string()))?;
        if !entry.saver.is_dirty() {
            return Ok(false);
        }
        save(self.storage.as_ref(), id, entry, SaveTrigger::Flush, now).await?;
        Ok(true)
    }

    /// Retry a failed save of `id` right away, restarting the retry budget.
    pub async fn retry_save(&mut self, id: &str, now: Instant) -> WorkspaceResult<bool> {
        let entry = self
            .open
            .get_mut(id)
            .ok_or_else(|| WorkspaceError::NotOpen(id.to_string()))?;
        if !entry.saver.manual_retry() {
            return Ok(false);
        }
        save(self.storage.as_ref(), id, entry, SaveTrigger::Retry, now).await?;
        Ok(true)
    }

    /// Flush and close `id`. The canvas stays open if the flush fails.
    pub async fn close(&mut self, id: &str, now: Instant) -> WorkspaceResult<()> {
        self.flush(id, now).await?;
        self.open.remove(id);
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        log::info!("closed canvas {}", id);
        Ok(())
    }

    /// Delete a canvas from storage, closing it without saving.
    pub async fn delete(&mut self, id: &str) -> WorkspaceResult<()> {
        self.storage.delete(id).await?;
        self.open.remove(id);
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        log::info!("deleted canvas {}", id);
        Ok(())
    }

    /// Serialized scene of an open canvas.
    pub fn scene_data(&self, id: &str) -> WorkspaceResult<SceneData> {
        self.open
            .get(id)
            .map(|o| o.canvas.scene_data())
            .ok_or_else(|| WorkspaceError::NotOpen(id.to_string()))
    }
}

/// Serialize the canvas as it is now and store it.
async fn save<S: Storage>(
    storage: &S,
    id: &str,
    entry: &mut OpenCanvas,
    trigger: SaveTrigger,
    now: Instant,
) -> StorageResult<()> {
    log::debug!("saving canvas {} ({:?})", id, trigger);
    entry.saver.begin();
    let result = match entry.canvas.to_json() {
        Ok(json) => storage.update(id, &json).await,
        Err(e) => Err(StorageError::Serialization(e.to_string())),
    };
    entry
        .saver
        .complete(now, result.as_ref().map(|r| r.updated_at));
    result.map(|_| ())
}
