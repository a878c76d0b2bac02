//! typetrace crate root
//!
//! Front-end over `typetrace-core`: opening the on-disk library, loading the
//! config, importing plain-text files and starting practice sessions. The
//! `terminal` module turns stdin lines into input events and renders the
//! ledger for a terminal.

pub mod terminal;

pub use typetrace_core::{
    Action, Cell, CellStatus, Config, InputEvent, Key, Ledger, Library, Modifiers, Practice,
    PracticeMode, ProgressRecord, ProgressStore, SavedText, TextSource, TraceError, Transition,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "TYPETRACE_CONFIG";

/// Default database location: `$HOME/.typetrace/library.redb`, falling back
/// to the current directory when no home directory is known.
pub fn default_library_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".typetrace").join("library.redb")
}

/// Load the config from `path`, else from `$TYPETRACE_CONFIG`, else defaults.
pub fn load_config(path: Option<&Path>) -> typetrace_core::Result<Config> {
    let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    match path.map(Path::to_path_buf).or(env_path) {
        Some(p) => {
            tracing::debug!("loading config from {}", p.display());
            Config::load_toml(p)
        }
        None => Ok(Config::default()),
    }
}

/// Open (or create) the redb library at `path`.
pub fn open_library<P: AsRef<Path>>(path: P) -> typetrace_core::Result<Arc<Library>> {
    Ok(Arc::new(Library::new_redb(path)?))
}

/// Throwaway library for demos and tests.
pub fn open_in_memory() -> Arc<Library> {
    Arc::new(Library::new_in_memory())
}

/// Read a UTF-8 text file into the library and return the new id.
pub fn import_file(library: &Library, name: &str, file: &Path) -> typetrace_core::Result<String> {
    let content = typetrace_core::utils::normalize_line_endings(&std::fs::read_to_string(file)?);
    if content.trim().is_empty() {
        return Err(TraceError::EmptyText);
    }
    library.save_text(name, &content)
}

/// Start a practice session on a library text.
pub fn start_practice(
    library: &Arc<Library>,
    text_id: &str,
    mode: PracticeMode,
    config: Config,
) -> typetrace_core::Result<Practice<Library>> {
    Practice::start(library.as_ref(), Arc::clone(library), text_id, mode, config)
}

/// One line of the `list` output.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TextSummary {
    pub id: String,
    pub name: String,
    pub chars: usize,
    pub timestamp: u64,
    pub trace: Option<usize>,
    pub copy: Option<usize>,
}

/// Number of cells a practice session over `content` has, which is what
/// saved cursors index into.
pub fn practice_len(content: &str, config: &Config) -> usize {
    typetrace_core::utils::prepare_reference(content, config)
        .chars()
        .count()
}

/// Summaries of every saved text with the cursor of each progress track.
pub fn summarize(library: &Library, config: &Config) -> typetrace_core::Result<Vec<TextSummary>> {
    let mut out = Vec::new();
    for text in library.list_texts()? {
        out.push(TextSummary {
            trace: library.load_cursor(&text.id, PracticeMode::Trace)?,
            copy: library.load_cursor(&text.id, PracticeMode::Copy)?,
            chars: practice_len(&text.content, config),
            id: text.id,
            name: text.name,
            timestamp: text.timestamp,
        });
    }
    Ok(out)
}
