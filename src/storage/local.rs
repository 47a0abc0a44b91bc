//! Local filesystem storage implementation.
//!
//! Every file is pretty-printed JSON written atomically (temp file, then
//! rename), so an interrupted run never leaves a half-written snapshot.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{CompetitionRecord, RegistrationStateEntry};
use crate::pipeline::DiffResult;
use crate::storage::{RunTimestamp, Snapshot, SnapshotStore};

const COMPETITIONS_KEY: &str = "comps.json";
const STATES_KEY: &str = "regState.json";
const NEW_COMPETITIONS_KEY: &str = "newComps.json";
const NEW_REGISTRATIONS_KEY: &str = "newRegs.json";
const STATE_CHANGES_KEY: &str = "regStateChanges.json";
const TIMESTAMP_KEY: &str = "timestamp.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Key of the raw detail file for a competition.
    fn detail_key(id: &str) -> String {
        format!("comps/{}.json", id)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read JSON data, treating absence and corruption as empty state.
    async fn read_json_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read_json(key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                log::info!("No {} found, starting empty", key);
                T::default()
            }
            Err(e) => {
                log::warn!("Ignoring unreadable {}: {}", key, e);
                T::default()
            }
        }
    }

    /// Load the raw detail stored for a competition.
    pub async fn load_detail(&self, id: &str) -> Result<Option<Value>> {
        self.read_json(&Self::detail_key(id)).await
    }
}

#[async_trait]
impl SnapshotStore for LocalStorage {
    async fn load_snapshot(&self) -> Result<Snapshot> {
        let competitions: Vec<CompetitionRecord> =
            self.read_json_or_default(COMPETITIONS_KEY).await;
        let registration_states: Vec<RegistrationStateEntry> =
            self.read_json_or_default(STATES_KEY).await;

        Ok(Snapshot {
            competitions,
            registration_states,
        })
    }

    async fn save_detail(&self, id: &str, detail: &Value) -> Result<()> {
        self.write_json(&Self::detail_key(id), detail).await
    }

    async fn save_snapshot(
        &self,
        snapshot: &Snapshot,
        diff: &DiffResult,
        run_at: DateTime<Utc>,
    ) -> Result<()> {
        self.write_json(NEW_REGISTRATIONS_KEY, &diff.new_registrations)
            .await?;
        self.write_json(COMPETITIONS_KEY, &snapshot.competitions)
            .await?;
        self.write_json(NEW_COMPETITIONS_KEY, &diff.new_competition_ids)
            .await?;
        self.write_json(STATES_KEY, &snapshot.registration_states)
            .await?;
        self.write_json(STATE_CHANGES_KEY, &diff.state_changes)
            .await?;
        self.write_json(TIMESTAMP_KEY, &RunTimestamp { last_run: run_at })
            .await?;

        log::info!(
            "Snapshot written to {}: {} competitions, {} states",
            self.root_dir.display(),
            snapshot.competitions.len(),
            snapshot.registration_states.len()
        );
        Ok(())
    }

    async fn last_run(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .read_json::<RunTimestamp>(TIMESTAMP_KEY)
            .await?
            .map(|t| t.last_run))
    }
}
