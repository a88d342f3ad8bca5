use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading, validating or writing conversation files.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("{operation} {path} failed: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {path}:{line}: {source}")]
    IoLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line} is not a valid session record: {source}")]
    JsonLineParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} is empty; expected a session header")]
    MissingHeader { path: PathBuf },

    #[error("{path}:{line}: first record must be the session header")]
    InvalidHeaderRecord { path: PathBuf, line: usize },

    #[error("{path}:{line}: session format version {found} is not supported")]
    UnsupportedVersion {
        path: PathBuf,
        line: usize,
        found: u32,
    },

    #[error("{path}:{line}: '{id}' is not a valid conversation id")]
    InvalidSessionId {
        path: PathBuf,
        line: usize,
        id: String,
    },

    #[error("header of {path} names session '{found}' but the file belongs to '{expected}'")]
    SessionIdMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("{path}:{line}: entry id '{id}' appears twice")]
    DuplicateEntryId {
        path: PathBuf,
        line: usize,
        id: String,
    },

    #[error("{path}:{line}: only entry records may follow the header")]
    InvalidEntryRecord { path: PathBuf, line: usize },

    #[error("{path}:{line}: `{field}` is not an RFC3339 timestamp: {value}")]
    InvalidTimestamp {
        path: PathBuf,
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("{path}:{line}: recorded cwd is relative: {cwd}")]
    NonAbsoluteCwd {
        path: PathBuf,
        line: usize,
        cwd: String,
    },

    #[error("cwd recorded for new sessions must be absolute: {path}")]
    NonAbsoluteCreateCwd { path: PathBuf },

    #[error("no session '{id}' found under {root}")]
    SessionNotFound { root: PathBuf, id: String },

    #[error("session '{id}' already exists at {path}")]
    SessionExists { path: PathBuf, id: String },

    #[error("cannot encode record for {path}: {source}")]
    JsonSerialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot format the current time as RFC3339: {0}")]
    ClockFormat(#[source] time::error::Format),
}

impl SessionStoreError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn io_line(path: impl Into<PathBuf>, line: usize, source: std::io::Error) -> Self {
        Self::IoLine {
            path: path.into(),
            line,
            source,
        }
    }

    #[must_use]
    pub fn json_line(path: impl Into<PathBuf>, line: usize, source: serde_json::Error) -> Self {
        Self::JsonLineParse {
            path: path.into(),
            line,
            source,
        }
    }

    #[must_use]
    pub fn json_serialize(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonSerialize {
            path: path.into(),
            source,
        }
    }
}
