//! Save scheduling for an open canvas: debounce, autosave and retries.
//!
//! Nothing here owns a timer. The workspace passes the current [`Instant`]
//! to [`SaveScheduler::due`] and performs the save itself.

use super::StorageError;
use crate::config::EngineConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Exponential backoff for failed saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        EngineConfig::default().retry_policy()
    }
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_retries,
        }
    }

    /// Delay before retry number `attempt` (1-based), or `None` once the
    /// retries are used up.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_retries {
            return None;
        }
        let factor = 2u32.checked_pow(attempt - 1)?;
        self.base_delay.checked_mul(factor)
    }
}

/// Coarse save status shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

/// Save status of one open canvas. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveState {
    pub status: SaveStatus,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub pending_retry_count: u32,
}

/// Why a save fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    Debounce,
    Autosave,
    Retry,
    /// Explicit flush, e.g. when switching canvases.
    Flush,
}

/// Deadlines and failure bookkeeping for one canvas.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    debounce: Duration,
    autosave_interval: Duration,
    retry: RetryPolicy,
    debounce_due: Option<Instant>,
    retry_due: Option<Instant>,
    /// Start of the current autosave window.
    autosave_from: Instant,
    failures: u32,
    dirty: bool,
    state: SaveState,
}

impl SaveScheduler {
    pub fn new(config: &EngineConfig, now: Instant) -> Self {
        Self {
            debounce: config.debounce(),
            autosave_interval: config.autosave_interval(),
            retry: config.retry_policy(),
            debounce_due: None,
            retry_due: None,
            autosave_from: now,
            failures: 0,
            dirty: false,
            state: SaveState::default(),
        }
    }

    pub fn state(&self) -> &SaveState {
        &self.state
    }

    /// Whether the canvas has changes not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn debounce_due(&self) -> Option<Instant> {
        self.debounce_due
    }

    pub fn retry_due(&self) -> Option<Instant> {
        self.retry_due
    }

    /// Record an edit: (re)start the debounce.
    ///
    /// A new edit also ends a failed state, so saving starts over. A
    /// deadline too far out to represent never fires; autosave still does.
    pub fn schedule(&mut self, now: Instant) {
        self.dirty = true;
        self.debounce_due = now.checked_add(self.debounce);
        self.retry_due = None;
        if self.failures > 0 {
            self.failures = 0;
            self.state.pending_retry_count = 0;
        }
        if self.state.status == SaveStatus::Error {
            self.state.status = SaveStatus::Idle;
        }
    }

    /// Drop the pending debounce without saving.
    pub fn cancel_debounce(&mut self) {
        self.debounce_due = None;
    }

    /// Reset after a manual retry request. Returns whether a save is needed.
    pub fn manual_retry(&mut self) -> bool {
        self.failures = 0;
        self.retry_due = None;
        self.state.pending_retry_count = 0;
        if self.state.status == SaveStatus::Error {
            self.state.status = SaveStatus::Idle;
        }
        self.dirty
    }

    /// The save that should fire at `now`, if any.
    pub fn due(&mut self, now: Instant) -> Option<SaveTrigger> {
        if self.state.status == SaveStatus::Error {
            return None;
        }
        if self.retry_due.is_some_and(|due| due <= now) {
            return Some(SaveTrigger::Retry);
        }
        if self.debounce_due.is_some_and(|due| due <= now) {
            return Some(SaveTrigger::Debounce);
        }
        if now.saturating_duration_since(self.autosave_from) >= self.autosave_interval {
            if self.dirty && self.retry_due.is_none() {
                return Some(SaveTrigger::Autosave);
            }
            self.autosave_from = now;
        }
        None
    }

    /// A save is starting.
    pub fn begin(&mut self) {
        self.debounce_due = None;
        self.retry_due = None;
        self.state.status = SaveStatus::Saving;
    }

    /// A save finished at `now`.
    pub fn complete(&mut self, now: Instant, result: Result<DateTime<Utc>, &StorageError>) {
        match result {
            Ok(saved_at) => {
                self.dirty = false;
                self.failures = 0;
                self.autosave_from = now;
                self.state = SaveState {
                    status: SaveStatus::Saved,
                    last_saved_at: Some(saved_at),
                    pending_retry_count: 0,
                };
            }
            Err(e) => {
                self.failures += 1;
                match self.retry.delay_for(self.failures) {
                    Some(delay) => {
                        log::warn!(
                            "save failed ({}), retry {}/{} in {:?}",
                            e,
                            self.failures,
                            self.retry.max_retries,
                            delay
                        );
                        self.retry_due = now.checked_add(delay);
                        self.state.pending_retry_count = self.failures;
                    }
                    None => {
                        log::error!("save failed ({}), giving up after {} retries", e, self.failures - 1);
                        self.retry_due = None;
                        self.state.status = SaveStatus::Error;
                        self.state.pending_retry_count = 0;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(now: Instant) -> SaveScheduler {
        SaveScheduler::new(&EngineConfig::default(), now)
    }

    fn failure() -> StorageError {
        StorageError::Io("disk full".to_string())
    }

    #[test]
    fn test_huge_delays_do_not_overflow() {
        let config = EngineConfig {
            debounce_ms: u64::MAX,
            retry_base_ms: u64::MAX,
            ..EngineConfig::default()
        };
        let t0 = Instant::now();
        let mut saver = SaveScheduler::new(&config, t0);

        saver.schedule(t0);
        assert_eq!(saver.debounce_due(), None);
        assert!(saver.is_dirty());

        saver.begin();
        saver.complete(t0, Err(&failure()));
        assert_eq!(saver.retry_due(), None);
        assert_eq!(saver.state().pending_retry_count, 1);
        assert_eq!(
            saver.due(t0 + Duration::from_secs(30)),
            Some(SaveTrigger::Autosave)
        );
    }

    #[test]
    fn test_retry_delays_double() {
        let policy = RetryPolicy::new(Duration::from_secs(1), 3);
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for(3), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_for(4), None);
        assert_eq!(policy.delay_for(0), None);
    }

    #[test]
    fn test_debounce_restarts_on_each_edit() {
        let t0 = Instant::now();
        let mut saver = scheduler(t0);
        saver.schedule(t0);
        saver.schedule(t0 + Duration::from_millis(1500));

        assert_eq!(saver.due(t0 + Duration::from_millis(2500)), None);
        assert_eq!(
            saver.due(t0 + Duration::from_millis(3500)),
            Some(SaveTrigger::Debounce)
        );
    }

    #[test]
    fn test_clean_canvas_never_autosaves() {
        let t0 = Instant::now();
        let mut saver = scheduler(t0);
        assert_eq!(saver.due(t0 + Duration::from_secs(31)), None);
        assert_eq!(saver.due(t0 + Duration::from_secs(95)), None);
    }

    #[test]
    fn test_autosave_forces_save_of_dirty_canvas() {
        let t0 = Instant::now();
        let mut saver = scheduler(t0);
        saver.schedule(t0 + Duration::from_secs(29));
        saver.cancel_debounce();
        assert_eq!(
            saver.due(t0 + Duration::from_secs(30)),
            Some(SaveTrigger::Autosave)
        );
    }

    #[test]
    fn test_retries_then_error() {
        let t0 = Instant::now();
        let mut saver = scheduler(t0);
        saver.schedule(t0);

        let mut now = t0 + Duration::from_secs(2);
        assert_eq!(saver.due(now), Some(SaveTrigger::Debounce));
        for (attempt, delay) in [1, 2, 4].into_iter().enumerate() {
            saver.begin();
            saver.complete(now, Err(&failure()));
            assert_eq!(saver.state().pending_retry_count, attempt as u32 + 1);
            assert_eq!(saver.retry_due(), Some(now + Duration::from_secs(delay)));
            assert_eq!(saver.due(now), None);
            now += Duration::from_secs(delay);
            assert_eq!(saver.due(now), Some(SaveTrigger::Retry));
        }
        saver.begin();
        saver.complete(now, Err(&failure()));

        assert_eq!(saver.state().status, SaveStatus::Error);
        assert_eq!(saver.due(now + Duration::from_secs(60)), None);
        assert!(saver.is_dirty());

        assert!(saver.manual_retry());
        assert_eq!(saver.state().status, SaveStatus::Idle);
    }

    #[test]
    fn test_new_edit_after_error_starts_over() {
        let t0 = Instant::now();
        let mut saver = SaveScheduler::new(
            &EngineConfig {
                max_retries: 0,
                ..EngineConfig::default()
            },
            t0,
        );
        saver.schedule(t0);
        saver.begin();
        saver.complete(t0, Err(&failure()));
        assert_eq!(saver.state().status, SaveStatus::Error);

        saver.schedule(t0 + Duration::from_secs(1));
        assert_eq!(saver.state().status, SaveStatus::Idle);
        assert_eq!(
            saver.due(t0 + Duration::from_secs(3)),
            Some(SaveTrigger::Debounce)
        );
    }

    #[test]
    fn test_success_clears_dirty() {
        let t0 = Instant::now();
        let mut saver = scheduler(t0);
        saver.schedule(t0);
        saver.begin();
        assert_eq!(saver.state().status, SaveStatus::Saving);
        let saved_at = Utc::now();
        saver.complete(t0, Ok(saved_at));

        assert!(!saver.is_dirty());
        assert_eq!(saver.state().status, SaveStatus::Saved);
        assert_eq!(saver.state().last_saved_at, Some(saved_at));
        assert_eq!(saver.due(t0 + Duration::from_secs(60)), None);
    }
}
