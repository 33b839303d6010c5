use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::dashboard::DashboardEntry;

/// Versioned set of approved-request snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSet {
    pub version: u64,
    pub snapshots: Vec<DashboardEntry>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot set changed (expected version {expected}, found {actual})")]
    Conflict { expected: u64, actual: u64 },
    #[error("snapshot mirror I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot mirror is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("snapshot store lock poisoned")]
    Poisoned,
    #[error("snapshot store was dropped")]
    Closed,
}

/// Shared store both dashboard views read and write.
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<SnapshotSet, SnapshotError>;

    /// Compare-and-swap: replace the set only when it is still at
    /// `expected_version`. Returns the new version.
    fn replace(
        &self,
        expected_version: u64,
        snapshots: Vec<DashboardEntry>,
    ) -> Result<u64, SnapshotError>;

    /// Receiver that observes every new version.
    fn subscribe(&self) -> watch::Receiver<u64>;
}

/// In-process store, optionally mirrored to a JSON file.
pub struct LocalSnapshotStore {
    state: Mutex<SnapshotSet>,
    mirror: Option<PathBuf>,
    notify: watch::Sender<u64>,
}

impl Default for LocalSnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSnapshotStore {
    pub fn new() -> Self {
        Self::from_set(SnapshotSet::default(), None)
    }

    fn from_set(set: SnapshotSet, mirror: Option<PathBuf>) -> Self {
        let (notify, _) = watch::channel(set.version);
        Self {
            state: Mutex::new(set),
            mirror,
            notify,
        }
    }

    /// Store backed by `path`. An unreadable or malformed file starts an
    /// empty set.
    pub fn with_mirror(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let set = match read_mirror(&path) {
            Ok(set) => set,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Ignoring unreadable snapshot mirror");
                SnapshotSet::default()
            }
        };
        Self::from_set(set, Some(path))
    }
}

fn read_mirror(path: &Path) -> Result<SnapshotSet, SnapshotError> {
    if !path.exists() {
        return Ok(SnapshotSet::default());
    }
    let raw = fs::read(path)?;
    Ok(serde_json::from_slice(&raw)?)
}

fn write_mirror(path: &Path, set: &SnapshotSet) -> Result<(), SnapshotError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(set)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl SnapshotStore for LocalSnapshotStore {
    fn load(&self) -> Result<SnapshotSet, SnapshotError> {
        self.state
            .lock()
            .map(|s| s.clone())
            .map_err(|_| SnapshotError::Poisoned)
    }

    fn replace(
        &self,
        expected_version: u64,
        snapshots: Vec<DashboardEntry>,
    ) -> Result<u64, SnapshotError> {
        let mut state = self.state.lock().map_err(|_| SnapshotError::Poisoned)?;
        if state.version != expected_version {
            return Err(SnapshotError::Conflict {
                expected: expected_version,
                actual: state.version,
            });
        }

        let next = SnapshotSet {
            version: state.version + 1,
            snapshots,
        };
        if let Some(path) = &self.mirror {
            write_mirror(path, &next)?;
        }
        *state = next;
        debug!(version = state.version, count = state.snapshots.len(), "Snapshot set replaced");
        self.notify.send_replace(state.version);
        Ok(state.version)
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::EntryId;
    use crate::model::StatusLabel;
    use chrono::NaiveDate;

    fn entry(id: &str) -> DashboardEntry {
        let day = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        DashboardEntry {
            id: EntryId::from(id),
            employee: "Jordan Lee".into(),
            role: "Engineering Manager".into(),
            request_type: "WFH".into(),
            status: StatusLabel::Approved,
            start_date: day,
            end_date: day,
            hours: None,
            notes: None,
            submitted: None,
            dates_label: None,
        }
    }

    #[test]
    fn stale_version_is_a_conflict() {
        let store = LocalSnapshotStore::new();
        assert_eq!(store.replace(0, vec![entry("a")]).unwrap(), 1);

        let err = store.replace(0, vec![entry("b")]).unwrap_err();
        assert!(matches!(err, SnapshotError::Conflict { expected: 0, actual: 1 }));
        assert_eq!(store.load().unwrap().snapshots, vec![entry("a")]);
    }

    #[test]
    fn subscribers_see_new_versions() {
        let store = LocalSnapshotStore::new();
        let rx = store.subscribe();
        store.replace(0, Vec::new()).unwrap();
        assert_eq!(*rx.borrow(), 1);
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn mirror_survives_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("approved.json");

        let store = LocalSnapshotStore::with_mirror(&path);
        store.replace(0, vec![entry("jordan-wfh")]).unwrap();
        drop(store);

        let reopened = LocalSnapshotStore::with_mirror(&path);
        let set = reopened.load().unwrap();
        assert_eq!(set.version, 1);
        assert_eq!(set.snapshots[0].id.as_str(), "jordan-wfh");
    }

    #[test]
    fn malformed_mirror_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("approved.json");
        fs::write(&path, b"[not json").unwrap();

        let store = LocalSnapshotStore::with_mirror(&path);
        assert_eq!(store.load().unwrap(), SnapshotSet::default());
    }
}
