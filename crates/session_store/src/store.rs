use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use session_runner::{ConversationEvent, ConversationId};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::SessionStoreError;
use crate::paths::session_file_name;
use crate::schema::{JsonLine, SessionEntry, SessionHeader, SESSION_FORMAT_VERSION};

/// One open JSONL session file: header, parsed entries and an append handle.
pub struct SessionStore {
    pub(crate) path: PathBuf,
    pub(crate) file: File,
    pub(crate) header: SessionHeader,
    pub(crate) entries: Vec<SessionEntry>,
    pub(crate) index_by_id: HashMap<String, usize>,
}

impl SessionStore {
    /// Creates `<root>/<created_at>_<id>.jsonl` holding only a v1 header.
    pub fn create_new(
        root: &Path,
        session_id: &ConversationId,
        cwd: &Path,
    ) -> Result<Self, SessionStoreError> {
        if !cwd.is_absolute() {
            return Err(SessionStoreError::NonAbsoluteCreateCwd {
                path: cwd.to_path_buf(),
            });
        }

        fs::create_dir_all(root)
            .map_err(|source| SessionStoreError::io("creating session directory", root, source))?;

        let created_at = now_rfc3339()?;
        let path = root.join(session_file_name(&created_at, session_id.as_str()));
        let mut file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => SessionStoreError::SessionExists {
                    path: path.clone(),
                    id: session_id.to_string(),
                },
                _ => SessionStoreError::io("creating session file", &path, source),
            })?;

        let header = SessionHeader::v1(
            session_id.as_str(),
            created_at,
            cwd.display().to_string(),
        );
        write_json_line(&path, &mut file, &header)?;

        Ok(Self {
            path,
            file,
            header,
            entries: Vec::new(),
            index_by_id: HashMap::new(),
        })
    }

    pub fn open(path: &Path) -> Result<Self, SessionStoreError> {
        let path = path.to_path_buf();
        let read_file = File::open(&path)
            .map_err(|source| SessionStoreError::io("opening session file", &path, source))?;
        let reader = BufReader::new(read_file);

        let mut header: Option<SessionHeader> = None;
        let mut entries = Vec::new();
        let mut index_by_id = HashMap::new();

        for (line_index, line_result) in reader.lines().enumerate() {
            let line_number = line_index + 1;
            let line = line_result
                .map_err(|source| SessionStoreError::io_line(&path, line_number, source))?;
            let parsed = parse_json_line(&path, line_number, &line)?;

            if line_number == 1 {
                match parsed {
                    JsonLine::Session(parsed_header) => {
                        validate_header_line(&path, line_number, &parsed_header)?;
                        header = Some(parsed_header);
                    }
                    JsonLine::Entry(_) => {
                        return Err(SessionStoreError::InvalidHeaderRecord {
                            path,
                            line: line_number,
                        });
                    }
                }

                continue;
            }

            match parsed {
                JsonLine::Session(_) => {
                    return Err(SessionStoreError::InvalidEntryRecord {
                        path,
                        line: line_number,
                    });
                }
                JsonLine::Entry(entry) => {
                    validate_entry_line(&path, line_number, &entry)?;
                    if index_by_id.contains_key(&entry.id) {
                        return Err(SessionStoreError::DuplicateEntryId {
                            path,
                            line: line_number,
                            id: entry.id,
                        });
                    }

                    index_by_id.insert(entry.id.clone(), entries.len());
                    entries.push(entry);
                }
            }
        }

        let header =
            header.ok_or_else(|| SessionStoreError::MissingHeader { path: path.clone() })?;

        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|source| {
                SessionStoreError::io("opening session file for append", &path, source)
            })?;

        Ok(Self {
            path,
            file,
            header,
            entries,
            index_by_id,
        })
    }

    /// Reads and validates only the header line of a session file.
    pub fn read_header(path: &Path) -> Result<SessionHeader, SessionStoreError> {
        let file = File::open(path)
            .map_err(|source| SessionStoreError::io("opening session file", path, source))?;
        let mut reader = BufReader::new(file);
        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .map_err(|source| SessionStoreError::io_line(path, 1, source))?;
        if read == 0 {
            return Err(SessionStoreError::MissingHeader {
                path: path.to_path_buf(),
            });
        }

        match parse_json_line(path, 1, line.trim_end_matches(['\r', '\n']))? {
            JsonLine::Session(header) => {
                validate_header_line(path, 1, &header)?;
                Ok(header)
            }
            JsonLine::Entry(_) => Err(SessionStoreError::InvalidHeaderRecord {
                path: path.to_path_buf(),
                line: 1,
            }),
        }
    }

    /// Persists `event` as a new entry line.
    pub fn append(&mut self, event: ConversationEvent) -> Result<&SessionEntry, SessionStoreError> {
        let entry = SessionEntry::new(Uuid::new_v4().to_string(), now_rfc3339()?, event);
        write_json_line(&self.path, &mut self.file, &entry)?;

        let index = self.entries.len();
        self.index_by_id.insert(entry.id.clone(), index);
        self.entries.push(entry);
        Ok(&self.entries[index])
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn header(&self) -> &SessionHeader {
        &self.header
    }

    #[must_use]
    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, id: &str) -> Option<&SessionEntry> {
        self.index_by_id.get(id).map(|index| &self.entries[*index])
    }
}

pub(crate) fn now_rfc3339() -> Result<String, SessionStoreError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(SessionStoreError::ClockFormat)
}

fn write_json_line<T: Serialize>(
    path: &Path,
    file: &mut File,
    record: &T,
) -> Result<(), SessionStoreError> {
    let mut line = serde_json::to_string(record)
        .map_err(|source| SessionStoreError::json_serialize(path, source))?;
    line.push('\n');

    file.write_all(line.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|source| SessionStoreError::io("appending session line", path, source))
}

/// Parses one line, dispatching on its `type` field.
pub(crate) fn parse_json_line(
    path: &Path,
    line_number: usize,
    line: &str,
) -> Result<JsonLine, SessionStoreError> {
    let value = serde_json::from_str::<Value>(line)
        .map_err(|source| SessionStoreError::json_line(path, line_number, source))?;

    let parsed = match value.get("type").and_then(Value::as_str) {
        Some("session") => serde_json::from_value(value).map(JsonLine::Session),
        _ => serde_json::from_value(value).map(JsonLine::Entry),
    };

    parsed.map_err(|source| SessionStoreError::json_line(path, line_number, source))
}

pub(crate) fn validate_header_line(
    path: &Path,
    line_number: usize,
    header: &SessionHeader,
) -> Result<(), SessionStoreError> {
    if header.version != SESSION_FORMAT_VERSION {
        return Err(SessionStoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            line: line_number,
            found: header.version,
        });
    }

    if ConversationId::parse(&header.session_id).is_err() {
        return Err(SessionStoreError::InvalidSessionId {
            path: path.to_path_buf(),
            line: line_number,
            id: header.session_id.clone(),
        });
    }

    validate_rfc3339(path, line_number, "created_at", &header.created_at)?;

    if !Path::new(&header.cwd).is_absolute() {
        return Err(SessionStoreError::NonAbsoluteCwd {
            path: path.to_path_buf(),
            line: line_number,
            cwd: header.cwd.clone(),
        });
    }

    Ok(())
}

pub(crate) fn validate_entry_line(
    path: &Path,
    line_number: usize,
    entry: &SessionEntry,
) -> Result<(), SessionStoreError> {
    validate_rfc3339(path, line_number, "ts", &entry.ts)
}

pub(crate) fn validate_rfc3339(
    path: &Path,
    line_number: usize,
    field: &'static str,
    value: &str,
) -> Result<(), SessionStoreError> {
    parse_rfc3339(path, line_number, field, value).map(|_| ())
}

pub(crate) fn parse_rfc3339(
    path: &Path,
    line_number: usize,
    field: &'static str,
    value: &str,
) -> Result<OffsetDateTime, SessionStoreError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|_| SessionStoreError::InvalidTimestamp {
        path: path.to_path_buf(),
        line: line_number,
        field,
        value: value.to_string(),
    })
}
