//! Error types for the text library, checkpoint store and session start.
//!
//! Typing itself never fails: classifier ambiguity, overruns past the end of
//! the reference text and undo/redo on empty stacks are all no-ops. Errors
//! only come out of storage and out of `Practice::start`.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Database error: {0}")]
    Storage(#[from] redb::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Reference text not found: {0}")]
    TextNotFound(String),

    #[error("Reference text is empty")]
    EmptyText,
}

pub type Result<T> = std::result::Result<T, TraceError>;

impl From<redb::DatabaseError> for TraceError {
    fn from(value: redb::DatabaseError) -> Self {
        Self::Storage(value.into())
    }
}

impl From<redb::TransactionError> for TraceError {
    fn from(value: redb::TransactionError) -> Self {
        Self::Storage(value.into())
    }
}

impl From<redb::TableError> for TraceError {
    fn from(value: redb::TableError) -> Self {
        Self::Storage(value.into())
    }
}

impl From<redb::StorageError> for TraceError {
    fn from(value: redb::StorageError) -> Self {
        Self::Storage(value.into())
    }
}

impl From<redb::CommitError> for TraceError {
    fn from(value: redb::CommitError) -> Self {
        Self::Storage(value.into())
    }
}

impl From<toml::de::Error> for TraceError {
    fn from(value: toml::de::Error) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<toml::ser::Error> for TraceError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Config(value.to_string())
    }
}

impl TraceError {
    /// True for the conditions that mean "cannot start a session".
    pub fn is_start_failure(&self) -> bool {
        matches!(self, Self::TextNotFound(_) | Self::EmptyText)
    }
}
