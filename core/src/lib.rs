//! typetrace-core
//!
//! Typing verification state machine: turns a stream of raw and IME-composed
//! input events into a per-character correctness ledger for a reference text,
//! with undo/redo over that ledger and resumable progress checkpoints.
//!
//! Public API:
//! - `Ledger`, `Cell`, `CellStatus` - the per-character record and its cursor
//! - `InputClassifier`, `InputEvent`, `Action` - raw signals to intents
//! - `matcher::apply` - judging typed text against the reference
//! - `History` - bounded undo/redo over ledger snapshots
//! - `CompletionDetector` - edge-triggered "session complete"
//! - `CheckpointBridge`, `Autosave`, `CheckpointTimer` - progress persistence
//! - `TraceSession` - the reducer owning one live ledger
//! - `Practice` - everything above behind `process_event`
//! - `Library` - saved texts and progress (in-memory or redb)
//! - `Config` - tunables, loadable from TOML
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod error;
pub use error::{Result, TraceError};

pub mod ledger;
pub use ledger::{Cell, CellStatus, Ledger};

pub mod classifier;
pub use classifier::{Action, InputClassifier, InputEvent, Key, Modifiers};

pub mod matcher;

pub mod history;
pub use history::{History, Snapshot, DEFAULT_HISTORY_CAP};

pub mod completion;
pub use completion::CompletionDetector;

pub mod library;
pub use library::{
    InMemoryLibrary, Library, PracticeMode, ProgressRecord, ProgressStore, RedbLibrary,
    SavedText, TextSource,
};

pub mod checkpoint;
pub use checkpoint::{Autosave, CheckpointBridge, CheckpointTimer, DEFAULT_AUTOSAVE_INTERVAL};

pub mod session;
pub use session::{TraceSession, Transition};

pub mod practice;
pub use practice::Practice;

/// Session tunables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Snapshots kept for undo. Older ones are dropped once exceeded.
    pub history_cap: usize,

    /// Seconds between periodic checkpoint writes
    pub autosave_interval_secs: u64,

    /// NFC-normalize the reference text on load. Typed chunks are compared
    /// as delivered.
    pub normalize_unicode: bool,

    /// Turn CRLF and lone CR in the reference into `\n`
    pub normalize_line_endings: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL.as_secs(),
            normalize_unicode: true,
            normalize_line_endings: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Autosave interval, never shorter than one second.
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }
}

/// Text helpers.
pub mod utils {
    use crate::Config;
    use unicode_normalization::UnicodeNormalization;

    /// NFC-normalize without trimming.
    pub fn nfc(s: &str) -> String {
        s.nfc().collect()
    }

    /// Replace CRLF and lone CR with `\n`.
    pub fn normalize_line_endings(s: &str) -> String {
        s.replace("\r\n", "\n").replace('\r', "\n")
    }

    /// Apply the configured normalizations to a freshly loaded reference text.
    pub fn prepare_reference(raw: &str, config: &Config) -> String {
        let text = if config.normalize_line_endings {
            normalize_line_endings(raw)
        } else {
            raw.to_string()
        };
        if config.normalize_unicode {
            nfc(&text)
        } else {
            text
        }
    }
}
