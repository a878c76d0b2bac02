//! Practice engine: classifier, session, completion and checkpoints wired
//! together behind one `process_event` entry point.
//!
//! After each call the front-end reads `ledger()`, `cursor()` and
//! `progress_percent()` to redraw.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::checkpoint::{Autosave, CheckpointBridge, CheckpointTimer};
use crate::classifier::{Action, InputClassifier, InputEvent};
use crate::error::{Result, TraceError};
use crate::ledger::Ledger;
use crate::library::{PracticeMode, ProgressStore, TextSource};
use crate::session::{TraceSession, Transition};
use crate::Config;

pub struct Practice<S: ProgressStore + ?Sized + 'static> {
    classifier: InputClassifier,
    session: TraceSession,
    bridge: CheckpointBridge<S>,
    autosave: Autosave,
    /// Latest committed cursor, read by the background timer
    published: Arc<AtomicUsize>,
    timer: Option<CheckpointTimer>,
    config: Config,
}

impl<S: ProgressStore + ?Sized + 'static> Practice<S> {
    /// Load the reference text and saved cursor and open a session.
    ///
    /// Fails with `TextNotFound` when the source has no such text and with
    /// `EmptyText` when it has nothing to type; nothing is initialized in
    /// either case. Storage errors while fetching the text are returned too.
    /// A checkpoint that cannot be read only means starting from 0.
    pub fn start<T: TextSource + ?Sized>(
        source: &T,
        store: Arc<S>,
        text_id: &str,
        mode: PracticeMode,
        config: Config,
    ) -> Result<Self> {
        let raw = source
            .reference_text(text_id)?
            .ok_or_else(|| TraceError::TextNotFound(text_id.to_string()))?;
        if crate::utils::prepare_reference(&raw, &config).is_empty() {
            return Err(TraceError::EmptyText);
        }

        let bridge = CheckpointBridge::new(store, text_id, mode);
        let saved = bridge.load();
        let session = TraceSession::resume(&raw, saved, &config);
        info!(
            text_id,
            %mode,
            cursor = session.cursor(),
            len = session.ledger().len(),
            "practice session started"
        );

        let mut autosave = Autosave::new(config.autosave_interval(), Instant::now());
        autosave.mark_saved(saved);
        Ok(Self {
            classifier: InputClassifier::new(),
            published: Arc::new(AtomicUsize::new(session.cursor())),
            session,
            bridge,
            autosave,
            timer: None,
            config,
        })
    }

    /// Classify and apply one raw input event.
    pub fn process_event(&mut self, event: InputEvent) -> Transition {
        let action = self.classifier.handle(event);
        self.dispatch(action)
    }

    /// Apply an already classified action (e.g. from a toolbar button).
    pub fn dispatch(&mut self, action: Action) -> Transition {
        let transition = self.session.apply(action);
        if transition.is_change() {
            self.published.store(self.session.cursor(), Ordering::Release);
        }
        if transition == Transition::Completed {
            let cursor = self.session.cursor();
            info!(text_id = self.bridge.text_id(), cursor, "practice session complete");
            if self.bridge.save(cursor) {
                self.autosave.mark_saved(cursor);
            }
        }
        transition
    }

    /// Throw away progress and history and save cursor 0 right away.
    ///
    /// A running autosave timer is stopped first and respawned after the
    /// write, so a tick in flight cannot land a stale cursor after the 0.
    pub fn restart(&mut self) {
        let timer = self.timer.take();
        let respawn = timer.is_some();
        if let Some(mut timer) = timer {
            timer.stop();
        }

        self.session.restart();
        self.classifier.reset();
        self.published.store(0, Ordering::Release);
        if self.bridge.save(0) {
            self.autosave.mark_saved(0);
        }
        if respawn {
            self.spawn_autosave();
        }
        debug!(text_id = self.bridge.text_id(), "practice session restarted");
    }

    /// Cooperative autosave: write the cursor if the interval has elapsed and
    /// it changed. Returns `true` when a write succeeded.
    pub fn tick(&mut self, now: Instant) -> bool {
        let cursor = self.session.cursor();
        if !self.autosave.due(now, cursor) {
            return false;
        }
        let saved = self.bridge.save(cursor);
        if saved {
            self.autosave.mark_saved(cursor);
        }
        saved
    }

    /// Save the current cursor now.
    pub fn flush(&mut self) -> bool {
        let cursor = self.session.cursor();
        let saved = self.bridge.save(cursor);
        if saved {
            self.autosave.mark_saved(cursor);
        }
        saved
    }

    /// Start the background autosave thread (no-op if already running).
    pub fn spawn_autosave(&mut self) {
        if self.is_autosaving() {
            return;
        }
        self.timer = Some(CheckpointTimer::spawn(
            self.bridge.clone(),
            Arc::clone(&self.published),
            self.config.autosave_interval(),
        ));
    }

    pub fn is_autosaving(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| t.is_running())
    }

    /// Stop the background timer, if any, and save once more.
    pub fn close(&mut self) -> bool {
        if let Some(mut timer) = self.timer.take() {
            timer.stop();
        }
        self.flush()
    }

    pub fn ledger(&self) -> &Ledger {
        self.session.ledger()
    }

    pub fn cursor(&self) -> usize {
        self.session.cursor()
    }

    pub fn progress_percent(&self) -> f64 {
        self.session.progress_percent()
    }

    pub fn is_complete(&self) -> bool {
        self.session.is_complete()
    }

    pub fn session(&self) -> &TraceSession {
        &self.session
    }

    pub fn mode(&self) -> PracticeMode {
        self.bridge.mode()
    }

    pub fn text_id(&self) -> &str {
        self.bridge.text_id()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
