//! Storage abstractions for the run-to-run snapshot.
//!
//! ## Directory Structure
//!
//! ```text
//! api/
//! ├── comps.json            # Trimmed records of every processed competition
//! ├── regState.json         # Registration state per competition
//! ├── newComps.json         # Ids first seen in the last run
//! ├── newRegs.json          # Registrants added in the last run, per competition
//! ├── regStateChanges.json  # Registration state transitions of the last run
//! ├── timestamp.json        # {"lastRun": ...}
//! └── comps/
//!     └── {id}.json         # Raw WCIF as fetched
//! ```

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::{CompetitionRecord, RegistrationStateEntry};
use crate::pipeline::DiffResult;

// Re-export for convenience
pub use local::LocalStorage;

/// Prior-run state the next run is compared against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub competitions: Vec<CompetitionRecord>,
    pub registration_states: Vec<RegistrationStateEntry>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.competitions.is_empty() && self.registration_states.is_empty()
    }
}

/// Contents of `timestamp.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTimestamp {
    #[serde(rename = "lastRun")]
    pub last_run: DateTime<Utc>,
}

/// Trait for snapshot storage backends.
///
/// Assumes a single active run; implementations do not lock.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the prior snapshot. Missing or unreadable parts load as empty.
    async fn load_snapshot(&self) -> Result<Snapshot>;

    /// Persist the raw detail of one competition as soon as it is fetched.
    async fn save_detail(&self, id: &str, detail: &Value) -> Result<()>;

    /// Replace the snapshot and record what changed in this run.
    async fn save_snapshot(
        &self,
        snapshot: &Snapshot,
        diff: &DiffResult,
        run_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Completion time of the last successful run, if any.
    async fn last_run(&self) -> Result<Option<DateTime<Utc>>>;
}
