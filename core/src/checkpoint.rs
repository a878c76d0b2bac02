//! Progress checkpoints.
//!
//! `CheckpointBridge` binds a `ProgressStore` to one text and mode. Writes are
//! fire-and-forget: a failure is logged and reported as `false`, never
//! retried and never propagated into typing.
//!
//! Periodic saves come in two flavours sharing the same coalescing rule (only
//! the latest cursor matters, unchanged cursors are not rewritten):
//! - `Autosave`, polled from the caller's event loop via `due`.
//! - `CheckpointTimer`, a background thread reading a published cursor.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::library::{PracticeMode, ProgressStore};

/// Default interval between periodic checkpoint writes.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5);

pub struct CheckpointBridge<S: ProgressStore + ?Sized> {
    store: Arc<S>,
    text_id: String,
    mode: PracticeMode,
}

impl<S: ProgressStore + ?Sized> Clone for CheckpointBridge<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            text_id: self.text_id.clone(),
            mode: self.mode,
        }
    }
}

impl<S: ProgressStore + ?Sized> CheckpointBridge<S> {
    pub fn new(store: Arc<S>, text_id: impl Into<String>, mode: PracticeMode) -> Self {
        Self {
            store,
            text_id: text_id.into(),
            mode,
        }
    }

    pub fn text_id(&self) -> &str {
        &self.text_id
    }

    pub fn mode(&self) -> PracticeMode {
        self.mode
    }

    /// Saved cursor, or 0 when absent or unreadable.
    pub fn load(&self) -> usize {
        match self.store.load_cursor(&self.text_id, self.mode) {
            Ok(cursor) => cursor.unwrap_or(0),
            Err(e) => {
                warn!(
                    text_id = %self.text_id,
                    mode = %self.mode,
                    "failed to load checkpoint, starting from 0: {}",
                    e
                );
                0
            }
        }
    }

    /// Write `cursor`. Returns `false` when the store failed.
    pub fn save(&self, cursor: usize) -> bool {
        match self.store.save_cursor(&self.text_id, self.mode, cursor) {
            Ok(()) => {
                debug!(text_id = %self.text_id, mode = %self.mode, cursor, "checkpoint saved");
                true
            }
            Err(e) => {
                warn!(
                    text_id = %self.text_id,
                    mode = %self.mode,
                    cursor,
                    "progress not saved: {}",
                    e
                );
                false
            }
        }
    }
}

/// Coalescing policy for periodic saves driven by the caller.
#[derive(Debug, Clone)]
pub struct Autosave {
    interval: Duration,
    last_fire: Instant,
    last_saved: Option<usize>,
}

impl Autosave {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_fire: now,
            last_saved: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when the interval has elapsed since the last fire and `cursor`
    /// differs from the last saved value. Elapsed intervals are consumed even
    /// when nothing needs writing.
    pub fn due(&mut self, now: Instant, cursor: usize) -> bool {
        if now.saturating_duration_since(self.last_fire) < self.interval {
            return false;
        }
        self.last_fire = now;
        self.last_saved != Some(cursor)
    }

    /// Record a successful write made through any path.
    pub fn mark_saved(&mut self, cursor: usize) {
        self.last_saved = Some(cursor);
    }
}

/// Background thread writing the published cursor every interval until
/// stopped. Dropping the timer stops it.
pub struct CheckpointTimer {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CheckpointTimer {
    pub fn spawn<S>(bridge: CheckpointBridge<S>, cursor: Arc<AtomicUsize>, interval: Duration) -> Self
    where
        S: ProgressStore + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::channel::<()>();
        let spawned = thread::Builder::new()
            .name("typetrace-autosave".to_string())
            .spawn(move || {
                let mut last_saved = None;
                loop {
                    match rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let current = cursor.load(Ordering::Acquire);
                            if last_saved != Some(current) && bridge.save(current) {
                                last_saved = Some(current);
                            }
                        }
                        // stop requested or timer dropped
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            });

        match spawned {
            Ok(handle) => Self {
                stop: Some(tx),
                handle: Some(handle),
            },
            Err(e) => {
                warn!("failed to start autosave thread: {}", e);
                Self {
                    stop: None,
                    handle: None,
                }
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Cancel the timer and wait for an in-flight write to finish.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("autosave thread panicked");
            }
        }
    }
}

impl Drop for CheckpointTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TraceError};
    use crate::library::Library;

    struct FailingStore;

    impl ProgressStore for FailingStore {
        fn load_cursor(&self, _: &str, _: PracticeMode) -> Result<Option<usize>> {
            Err(TraceError::Config("unavailable".into()))
        }

        fn save_cursor(&self, _: &str, _: PracticeMode, _: usize) -> Result<()> {
            Err(TraceError::Config("unavailable".into()))
        }
    }

    #[test]
    fn test_load_defaults_to_zero() {
        let bridge = CheckpointBridge::new(Arc::new(Library::new_in_memory()), "t", PracticeMode::Trace);
        assert_eq!(bridge.load(), 0);
        assert!(bridge.save(7));
        assert_eq!(bridge.load(), 7);
    }

    #[test]
    fn test_failures_degrade_quietly() {
        let bridge = CheckpointBridge::new(Arc::new(FailingStore), "t", PracticeMode::Trace);
        assert_eq!(bridge.load(), 0);
        assert!(!bridge.save(3));
    }

    #[test]
    fn test_autosave_waits_for_interval() {
        let start = Instant::now();
        let mut auto = Autosave::new(Duration::from_secs(5), start);
        assert!(!auto.due(start + Duration::from_secs(4), 1));
        assert!(auto.due(start + Duration::from_secs(5), 1));
        // next window starts at the last fire
        assert!(!auto.due(start + Duration::from_secs(9), 2));
        assert!(auto.due(start + Duration::from_secs(10), 2));
    }

    #[test]
    fn test_autosave_skips_unchanged_cursor() {
        let start = Instant::now();
        let mut auto = Autosave::new(Duration::from_secs(5), start);
        auto.mark_saved(4);
        assert!(!auto.due(start + Duration::from_secs(6), 4));
        assert!(auto.due(start + Duration::from_secs(12), 5));
    }

    #[test]
    fn test_timer_writes_latest_cursor_and_stops() {
        let lib = Arc::new(Library::new_in_memory());
        let bridge = CheckpointBridge::new(Arc::clone(&lib), "t", PracticeMode::Copy);
        let cursor = Arc::new(AtomicUsize::new(0));
        let mut timer = CheckpointTimer::spawn(bridge, Arc::clone(&cursor), Duration::from_millis(10));
        assert!(timer.is_running());

        cursor.store(3, Ordering::Release);
        cursor.store(9, Ordering::Release);
        let deadline = Instant::now() + Duration::from_secs(5);
        while lib.load_cursor("t", PracticeMode::Copy).unwrap() != Some(9) {
            assert!(Instant::now() < deadline, "timer never wrote the cursor");
            thread::sleep(Duration::from_millis(5));
        }

        timer.stop();
        assert!(!timer.is_running());
        cursor.store(11, Ordering::Release);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(lib.load_cursor("t", PracticeMode::Copy).unwrap(), Some(9));
    }
}
