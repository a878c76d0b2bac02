//! Saved reference texts and per-mode progress checkpoints.
//!
//! Sessions only see two narrow seams: `TextSource` (fetch a reference text by
//! id) and `ProgressStore` (load/save a cursor per text and mode). `Library`
//! implements both and switches between two backends:
//! - `InMemory`: thread-safe map, used by tests and throwaway sessions.
//! - `Redb`: persistent storage with bincode-encoded rows.
//!
//! Deleting a text also deletes every progress record that belongs to it.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{ReadableTable, TableDefinition};

use crate::error::Result;

/// Independent progress track over the same text. Cursors saved under one
/// mode never affect the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeMode {
    /// Retype over the reference with per-character judgement
    Trace,
    /// Copy the reference into a separate pane
    Copy,
}

impl PracticeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Copy => "copy",
        }
    }
}

impl Default for PracticeMode {
    fn default() -> Self {
        Self::Trace
    }
}

impl fmt::Display for PracticeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PracticeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "copy" => Ok(Self::Copy),
            other => Err(format!("unknown practice mode '{other}'")),
        }
    }
}

/// A reference text saved to the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedText {
    pub id: String,
    pub name: String,
    pub content: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// Last saved cursor for one text in one mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub text_id: String,
    pub mode: PracticeMode,
    pub position: usize,
    pub timestamp: u64,
}

/// Source of reference texts.
pub trait TextSource: Send + Sync {
    /// `Ok(None)` when the id is unknown.
    fn reference_text(&self, id: &str) -> Result<Option<String>>;
}

/// Checkpoint persistence keyed by text id and mode.
pub trait ProgressStore: Send + Sync {
    /// `Ok(None)` when nothing was saved yet.
    fn load_cursor(&self, text_id: &str, mode: PracticeMode) -> Result<Option<usize>>;

    fn save_cursor(&self, text_id: &str, mode: PracticeMode, cursor: usize) -> Result<()>;
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Default)]
struct Shelves {
    texts: Vec<SavedText>,
    progress: HashMap<(String, PracticeMode), ProgressRecord>,
}

/// Thread-safe in-memory library.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLibrary {
    inner: Arc<RwLock<Shelves>>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_text(&self, name: &str, content: &str) -> String {
        let mut shelves = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut stamp = now_millis();
        while shelves.texts.iter().any(|t| t.id == stamp.to_string()) {
            stamp += 1;
        }
        let id = stamp.to_string();
        shelves.texts.push(SavedText {
            id: id.clone(),
            name: name.to_string(),
            content: content.to_string(),
            timestamp: now_millis(),
        });
        id
    }

    pub fn text(&self, id: &str) -> Option<SavedText> {
        let shelves = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        shelves.texts.iter().find(|t| t.id == id).cloned()
    }

    pub fn list_texts(&self) -> Vec<SavedText> {
        let shelves = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        shelves.texts.clone()
    }

    /// Returns `true` when a text was removed.
    pub fn delete_text(&self, id: &str) -> bool {
        let mut shelves = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = shelves.texts.len();
        shelves.texts.retain(|t| t.id != id);
        shelves.progress.retain(|(text_id, _), _| text_id != id);
        shelves.texts.len() != before
    }

    pub fn progress(&self, text_id: &str, mode: PracticeMode) -> Option<ProgressRecord> {
        let shelves = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        shelves.progress.get(&(text_id.to_string(), mode)).cloned()
    }

    pub fn all_progress(&self) -> Vec<ProgressRecord> {
        let shelves = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        shelves.progress.values().cloned().collect()
    }

    pub fn save_progress(&self, text_id: &str, mode: PracticeMode, position: usize) {
        let mut shelves = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        shelves.progress.insert(
            (text_id.to_string(), mode),
            ProgressRecord {
                text_id: text_id.to_string(),
                mode,
                position,
                timestamp: now_millis(),
            },
        );
    }
}

const TEXTS: TableDefinition<&str, &[u8]> = TableDefinition::new("texts");
const PROGRESS: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("progress");

/// Redb-backed library. Each write is its own transaction.
pub struct RedbLibrary {
    db: redb::Database,
    path: std::path::PathBuf,
}

impl fmt::Debug for RedbLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbLibrary").field("path", &self.path).finish()
    }
}

impl RedbLibrary {
    /// Create or open a database at `path`, creating parent directories.
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path.as_ref())?;
        Ok(Self {
            db,
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn save_text(&self, name: &str, content: &str) -> Result<String> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut table = write_txn.open_table(TEXTS)?;
            let mut stamp = now_millis();
            while table.get(stamp.to_string().as_str())?.is_some() {
                stamp += 1;
            }
            let id = stamp.to_string();
            let row = SavedText {
                id: id.clone(),
                name: name.to_string(),
                content: content.to_string(),
                timestamp: now_millis(),
            };
            let bytes = bincode::serialize(&row)?;
            table.insert(id.as_str(), bytes.as_slice())?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    pub fn text(&self, id: &str) -> Result<Option<SavedText>> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(TEXTS) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match table.get(id)? {
            Some(guard) => Ok(Some(bincode::deserialize(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All texts, oldest first.
    pub fn list_texts(&self) -> Result<Vec<SavedText>> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(TEXTS) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for item in table.iter()? {
            let (_, v) = item?;
            out.push(bincode::deserialize::<SavedText>(v.value())?);
        }
        out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    /// Remove a text and all of its progress. Returns `true` when the text
    /// existed.
    pub fn delete_text(&self, id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut texts = write_txn.open_table(TEXTS)?;
            let removed = texts.remove(id)?.is_some();

            let mut progress = write_txn.open_table(PROGRESS)?;
            let mut stale = Vec::new();
            for item in progress.iter()? {
                let (k, _) = item?;
                let (text_id, mode) = k.value();
                if text_id == id {
                    stale.push(mode.to_string());
                }
            }
            for mode in &stale {
                progress.remove((id, mode.as_str()))?;
            }
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    pub fn progress(&self, text_id: &str, mode: PracticeMode) -> Result<Option<ProgressRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(PROGRESS) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match table.get((text_id, mode.as_str()))? {
            Some(guard) => Ok(Some(bincode::deserialize(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn all_progress(&self) -> Result<Vec<ProgressRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(PROGRESS) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for item in table.iter()? {
            let (_, v) = item?;
            out.push(bincode::deserialize::<ProgressRecord>(v.value())?);
        }
        Ok(out)
    }

    pub fn save_progress(&self, text_id: &str, mode: PracticeMode, position: usize) -> Result<()> {
        let record = ProgressRecord {
            text_id: text_id.to_string(),
            mode,
            position,
            timestamp: now_millis(),
        };
        let bytes = bincode::serialize(&record)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROGRESS)?;
            table.insert((text_id, mode.as_str()), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// Backend switch used by front-ends.
#[derive(Clone, Debug)]
pub enum Library {
    InMemory(InMemoryLibrary),
    Redb(Arc<RedbLibrary>),
}

impl Library {
    pub fn new_in_memory() -> Self {
        Library::InMemory(InMemoryLibrary::new())
    }

    pub fn new_redb<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Library::Redb(Arc::new(RedbLibrary::new(path)?)))
    }

    pub fn save_text(&self, name: &str, content: &str) -> Result<String> {
        match self {
            Library::InMemory(m) => Ok(m.save_text(name, content)),
            Library::Redb(r) => r.save_text(name, content),
        }
    }

    pub fn text(&self, id: &str) -> Result<Option<SavedText>> {
        match self {
            Library::InMemory(m) => Ok(m.text(id)),
            Library::Redb(r) => r.text(id),
        }
    }

    pub fn list_texts(&self) -> Result<Vec<SavedText>> {
        match self {
            Library::InMemory(m) => Ok(m.list_texts()),
            Library::Redb(r) => r.list_texts(),
        }
    }

    pub fn delete_text(&self, id: &str) -> Result<bool> {
        match self {
            Library::InMemory(m) => Ok(m.delete_text(id)),
            Library::Redb(r) => r.delete_text(id),
        }
    }

    pub fn progress(&self, text_id: &str, mode: PracticeMode) -> Result<Option<ProgressRecord>> {
        match self {
            Library::InMemory(m) => Ok(m.progress(text_id, mode)),
            Library::Redb(r) => r.progress(text_id, mode),
        }
    }

    pub fn all_progress(&self) -> Result<Vec<ProgressRecord>> {
        match self {
            Library::InMemory(m) => Ok(m.all_progress()),
            Library::Redb(r) => r.all_progress(),
        }
    }

    pub fn save_progress(&self, text_id: &str, mode: PracticeMode, position: usize) -> Result<()> {
        match self {
            Library::InMemory(m) => {
                m.save_progress(text_id, mode, position);
                Ok(())
            }
            Library::Redb(r) => r.save_progress(text_id, mode, position),
        }
    }
}

impl TextSource for Library {
    fn reference_text(&self, id: &str) -> Result<Option<String>> {
        Ok(self.text(id)?.map(|t| t.content))
    }
}

impl ProgressStore for Library {
    fn load_cursor(&self, text_id: &str, mode: PracticeMode) -> Result<Option<usize>> {
        Ok(self.progress(text_id, mode)?.map(|p| p.position))
    }

    fn save_cursor(&self, text_id: &str, mode: PracticeMode, cursor: usize) -> Result<()> {
        self.save_progress(text_id, mode, cursor)
    }
}

impl From<InMemoryLibrary> for Library {
    fn from(value: InMemoryLibrary) -> Self {
        Library::InMemory(value)
    }
}
