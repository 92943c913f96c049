//! Best-effort local cache of in-progress answers, one snapshot per attempt.
//!
//! Nothing here is authoritative: a failed write is logged and forgotten, and
//! an unreadable snapshot is reported as absent.

use chrono::Utc;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{debug, warn};

use crate::models::{AnswerEntry, AttemptId, DraftSnapshot};

pub trait DraftStore: Send + Sync {
    /// Replaces whatever was stored for `attempt_id`.
    fn put(&self, attempt_id: AttemptId, answers: &[AnswerEntry]);
    fn get(&self, attempt_id: AttemptId) -> Option<Vec<AnswerEntry>>;
    fn clear(&self, attempt_id: AttemptId);
}

fn draft_key(attempt_id: AttemptId) -> String {
    format!("intento_{attempt_id}")
}

fn snapshot(answers: &[AnswerEntry]) -> DraftSnapshot {
    DraftSnapshot {
        respuestas: answers.to_vec(),
        timestamp: Utc::now(),
    }
}

/// One JSON file per attempt under a directory.
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, attempt_id: AttemptId) -> PathBuf {
        self.dir.join(format!("{}.json", draft_key(attempt_id)))
    }
}

impl DraftStore for FileDraftStore {
    fn put(&self, attempt_id: AttemptId, answers: &[AnswerEntry]) {
        let path = self.path_for(attempt_id);
        let body = match serde_json::to_vec(&snapshot(answers)) {
            Ok(b) => b,
            Err(e) => {
                warn!(attempt_id, error = %e, "could not encode draft");
                return;
            }
        };
        // readers only ever see a complete snapshot
        let tmp = path.with_extension("json.tmp");
        let res = fs::write(&tmp, body).and_then(|_| fs::rename(&tmp, &path));
        if let Err(e) = res {
            warn!(attempt_id, error = %e, "could not write draft");
        }
    }

    fn get(&self, attempt_id: AttemptId) -> Option<Vec<AnswerEntry>> {
        let raw = fs::read(self.path_for(attempt_id)).ok()?;
        match serde_json::from_slice::<DraftSnapshot>(&raw) {
            Ok(s) => Some(s.respuestas),
            Err(e) => {
                debug!(attempt_id, error = %e, "ignoring unreadable draft");
                None
            }
        }
    }

    fn clear(&self, attempt_id: AttemptId) {
        match fs::remove_file(self.path_for(attempt_id)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(attempt_id, error = %e, "could not remove draft"),
        }
    }
}

/// Keeps serialized snapshots in memory.
#[derive(Default)]
pub struct MemoryDraftStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw text under an attempt's key, bypassing encoding.
    pub fn put_raw(&self, attempt_id: AttemptId, raw: impl Into<String>) {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(draft_key(attempt_id), raw.into());
        }
    }
}

impl DraftStore for MemoryDraftStore {
    fn put(&self, attempt_id: AttemptId, answers: &[AnswerEntry]) {
        match serde_json::to_string(&snapshot(answers)) {
            Ok(raw) => self.put_raw(attempt_id, raw),
            Err(e) => warn!(attempt_id, error = %e, "could not encode draft"),
        }
    }

    fn get(&self, attempt_id: AttemptId) -> Option<Vec<AnswerEntry>> {
        let map = self.entries.lock().ok()?;
        let raw = map.get(&draft_key(attempt_id))?;
        serde_json::from_str::<DraftSnapshot>(raw)
            .ok()
            .map(|s| s.respuestas)
    }

    fn clear(&self, attempt_id: AttemptId) {
        if let Ok(mut map) = self.entries.lock() {
            map.remove(&draft_key(attempt_id));
        }
    }
}
