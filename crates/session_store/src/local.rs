use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use session_runner::{
    lock_unpoisoned, BoxError, Conversation, ConversationEvent, ConversationHandle,
    ConversationId, ConversationStore, ConversationSummary,
};
use tracing::{debug, warn};

use crate::error::SessionStoreError;
use crate::paths::{is_session_file_for, session_id_from_path, session_root};
use crate::schema::SessionHeader;
use crate::store::{parse_rfc3339, SessionStore};

/// Directory of JSONL session files, one per conversation.
#[derive(Debug, Clone)]
pub struct LocalConversationStore {
    root: PathBuf,
    cwd: PathBuf,
}

impl LocalConversationStore {
    /// Store rooted at `root`; new sessions record `cwd` in their header.
    pub fn new(root: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cwd: cwd.into(),
        }
    }

    /// Store under `<cwd>/.agent/sessions`.
    pub fn for_cwd(cwd: &Path) -> Self {
        Self::new(session_root(cwd), cwd)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists at most `limit` sessions, newest `created_at` first.
    ///
    /// A missing root directory lists as empty. Files whose header cannot be read
    /// or fails validation are skipped with a warning; [`Self::open_session`] still
    /// rejects them.
    pub fn list_sessions(&self, limit: usize) -> Result<Vec<ConversationSummary>, SessionStoreError> {
        let mut summaries = Vec::new();

        for path in self.session_paths()? {
            match session_summary(&path) {
                Ok(summary) => summaries.push(summary),
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping unreadable session file");
                }
            }
        }

        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        summaries.truncate(limit);
        debug!(root = %self.root.display(), count = summaries.len(), "listed sessions");

        Ok(summaries)
    }

    pub fn open_session(&self, id: &ConversationId) -> Result<StoredConversation, SessionStoreError> {
        let path = self
            .find_session_path(id)?
            .ok_or_else(|| SessionStoreError::SessionNotFound {
                root: self.root.clone(),
                id: id.to_string(),
            })?;

        let session = SessionStore::open(&path)?;
        check_file_owner(&path, session.header())?;
        debug!(path = %path.display(), entries = session.entries().len(), "opened session");

        Ok(StoredConversation::new(id.clone(), session))
    }

    pub fn create_session(
        &self,
        id: &ConversationId,
    ) -> Result<StoredConversation, SessionStoreError> {
        if let Some(path) = self.find_session_path(id)? {
            return Err(SessionStoreError::SessionExists {
                path,
                id: id.to_string(),
            });
        }

        let session = SessionStore::create_new(&self.root, id, &self.cwd)?;
        debug!(path = %session.path().display(), "created session");

        Ok(StoredConversation::new(id.clone(), session))
    }

    fn session_paths(&self) -> Result<Vec<PathBuf>, SessionStoreError> {
        let read_dir = match fs::read_dir(&self.root) {
            Ok(read_dir) => read_dir,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(SessionStoreError::io(
                    "reading session directory",
                    &self.root,
                    source,
                ))
            }
        };

        let mut paths = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| {
                SessionStoreError::io("reading session directory", &self.root, source)
            })?;
            let path = entry.path();
            if path.is_file() && session_id_from_path(&path).is_some() {
                paths.push(path);
            }
        }

        paths.sort();
        Ok(paths)
    }

    fn find_session_path(&self, id: &ConversationId) -> Result<Option<PathBuf>, SessionStoreError> {
        Ok(self
            .session_paths()?
            .into_iter()
            .find(|path| is_session_file_for(path, id.as_str())))
    }
}

fn session_summary(path: &Path) -> Result<ConversationSummary, SessionStoreError> {
    let header = SessionStore::read_header(path)?;
    check_file_owner(path, &header)?;

    let id = ConversationId::parse(&header.session_id).map_err(|_| {
        SessionStoreError::InvalidSessionId {
            path: path.to_path_buf(),
            line: 1,
            id: header.session_id.clone(),
        }
    })?;
    let created_at = parse_rfc3339(path, 1, "created_at", &header.created_at)?;

    Ok(ConversationSummary { id, created_at })
}

fn check_file_owner(path: &Path, header: &SessionHeader) -> Result<(), SessionStoreError> {
    match session_id_from_path(path) {
        Some(expected) if expected == header.session_id => Ok(()),
        expected => Err(SessionStoreError::SessionIdMismatch {
            path: path.to_path_buf(),
            expected: expected.unwrap_or_default().to_string(),
            found: header.session_id.clone(),
        }),
    }
}

impl ConversationStore for LocalConversationStore {
    fn list(&self, limit: usize) -> Result<Vec<ConversationSummary>, BoxError> {
        Ok(self.list_sessions(limit)?)
    }

    fn load(&self, id: &ConversationId) -> Result<ConversationHandle, BoxError> {
        Ok(Arc::new(self.open_session(id)?))
    }

    fn create(&self, id: &ConversationId) -> Result<ConversationHandle, BoxError> {
        Ok(Arc::new(self.create_session(id)?))
    }
}

/// Conversation handle backed by an open session file.
pub struct StoredConversation {
    id: ConversationId,
    session: Mutex<SessionStore>,
}

impl StoredConversation {
    fn new(id: ConversationId, session: SessionStore) -> Self {
        Self {
            id,
            session: Mutex::new(session),
        }
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        lock_unpoisoned(&self.session).path().to_path_buf()
    }

    #[must_use]
    pub fn header(&self) -> SessionHeader {
        lock_unpoisoned(&self.session).header().clone()
    }
}

impl Conversation for StoredConversation {
    fn id(&self) -> &ConversationId {
        &self.id
    }

    fn events(&self) -> Vec<ConversationEvent> {
        lock_unpoisoned(&self.session).replay_events()
    }

    fn append(&self, event: ConversationEvent) -> Result<(), BoxError> {
        lock_unpoisoned(&self.session).append(event)?;
        Ok(())
    }
}
