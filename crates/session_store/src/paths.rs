use std::path::{Path, PathBuf};

pub const SESSION_DIR: [&str; 2] = [".agent", "sessions"];
pub const SESSION_FILE_EXTENSION: &str = "jsonl";

#[must_use]
pub fn session_root(cwd: &Path) -> PathBuf {
    cwd.join(SESSION_DIR[0]).join(SESSION_DIR[1])
}

#[must_use]
pub fn sanitize_timestamp_for_filename(timestamp: &str) -> String {
    timestamp
        .chars()
        .map(|c| match c {
            ':' | '/' | '\\' | ' ' => '-',
            _ => c,
        })
        .collect()
}

#[must_use]
pub fn session_file_name(created_at: &str, session_id: &str) -> String {
    format!(
        "{}_{}.{SESSION_FILE_EXTENSION}",
        sanitize_timestamp_for_filename(created_at),
        session_id
    )
}

/// Extracts the session id from a `<timestamp>_<id>.jsonl` file name.
///
/// Sanitized RFC3339 timestamps never contain `_`, so the id is everything after
/// the first underscore.
#[must_use]
pub fn session_id_from_path(path: &Path) -> Option<&str> {
    if !path
        .extension()
        .is_some_and(|ext| ext == SESSION_FILE_EXTENSION)
    {
        return None;
    }

    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.split_once('_'))
        .map(|(_, id)| id)
        .filter(|id| !id.is_empty())
}

#[must_use]
pub fn is_session_file_for(path: &Path, session_id: &str) -> bool {
    session_id_from_path(path) == Some(session_id)
}
