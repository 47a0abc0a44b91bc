// src/pipeline/watch.rs

//! One watch pass over the competition registry.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::error::Result;
use crate::models::{CompetitionRecord, RegistrationStateEntry, Wcif};
use crate::notify::NotificationSink;
use crate::pipeline::classify::registration_state;
use crate::pipeline::diff::{CompetitionDiff, DiffEngine, DiffResult};
use crate::pipeline::policy::NotificationPolicy;
use crate::services::{CompetitionApi, MembershipDirectory};
use crate::storage::{Snapshot, SnapshotStore};

/// Collaborators of a watch pass.
pub struct WatchContext<'a> {
    pub api: &'a CompetitionApi,
    pub store: &'a dyn SnapshotStore,
    pub directory: &'a dyn MembershipDirectory,
    pub sink: &'a dyn NotificationSink,
    pub policy: &'a NotificationPolicy,
    pub closing_window: Duration,
}

/// Counters reported at the end of a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub listed: usize,
    pub processed: usize,
    pub skipped: usize,
    pub new_competitions: usize,
    pub new_registrations: usize,
    pub state_changes: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

impl RunSummary {
    fn log(&self) {
        crate::utils::log::summary(
            "Watch run",
            &[
                ("listed", self.listed.to_string()),
                ("processed", self.processed.to_string()),
                ("skipped", self.skipped.to_string()),
                ("new competitions", self.new_competitions.to_string()),
                ("new registrations", self.new_registrations.to_string()),
                ("state changes", self.state_changes.to_string()),
                ("notifications sent", self.notifications_sent.to_string()),
                ("notifications failed", self.notifications_failed.to_string()),
            ],
        );
    }
}

/// A detail that decoded and trimmed cleanly.
struct Fetched {
    wcif: Wcif,
    record: CompetitionRecord,
}

/// Run one pass: crawl, diff against the last snapshot, notify, persist.
///
/// Competitions are handled one at a time in listing order. A detail that
/// cannot be fetched or trimmed is skipped and left out of the new
/// snapshot. Listing, directory and storage failures abort the pass.
pub async fn run_watch(ctx: &WatchContext<'_>, now: DateTime<Utc>) -> Result<RunSummary> {
    crate::utils::log::header(&format!("compwatch run at {}", now.to_rfc3339()));

    let previous = ctx.store.load_snapshot().await?;
    log::info!(
        "Loaded snapshot: {} competitions, {} states",
        previous.competitions.len(),
        previous.registration_states.len()
    );

    let members = ctx.directory.members().await?;
    let ids = ctx.api.list_active_ids(now.date_naive()).await?;
    log::info!("Listing returned {} active competitions", ids.len());

    let engine = DiffEngine::new(&previous);
    let mut summary = RunSummary {
        listed: ids.len(),
        ..RunSummary::default()
    };
    let mut current = Snapshot::default();
    let mut diffs: Vec<CompetitionDiff> = Vec::with_capacity(ids.len());

    for id in &ids {
        let Some(Fetched { wcif, record }) = fetch_competition(ctx, id).await? else {
            summary.skipped += 1;
            continue;
        };

        let state = registration_state(wcif.registration_info.as_ref(), now, ctx.closing_window);
        let diff = engine.compare(&record, state);
        deliver(ctx, &diff, &wcif, &members, &mut summary).await;

        current
            .registration_states
            .push(RegistrationStateEntry::new(&record.id, state));
        current.competitions.push(record);
        diffs.push(diff);
        summary.processed += 1;
    }

    let result = DiffResult::assemble(&diffs);
    summary.new_competitions = result.new_competition_ids.len();
    summary.new_registrations = result.new_registration_count();
    summary.state_changes = result.state_changes.len();

    ctx.store.save_snapshot(&current, &result, now).await?;
    summary.log();

    Ok(summary)
}

/// Fetch, persist and decode one detail. `Ok(None)` means skip.
async fn fetch_competition(ctx: &WatchContext<'_>, id: &str) -> Result<Option<Fetched>> {
    let detail: Value = match ctx.api.fetch_detail(id).await {
        Ok(detail) => detail,
        Err(failure) => {
            log::warn!("Skipping {}: {}", id, failure);
            return Ok(None);
        }
    };

    ctx.store.save_detail(id, &detail).await?;

    let wcif: Wcif = match serde_json::from_value(detail) {
        Ok(wcif) => wcif,
        Err(e) => {
            log::warn!("Skipping {}: undecodable WCIF: {}", id, e);
            return Ok(None);
        }
    };

    match CompetitionRecord::from_wcif(&wcif) {
        Ok(record) => Ok(Some(Fetched { wcif, record })),
        Err(e) => {
            log::warn!("Skipping {}: {}", id, e);
            Ok(None)
        }
    }
}

async fn deliver(
    ctx: &WatchContext<'_>,
    diff: &CompetitionDiff,
    wcif: &Wcif,
    members: &HashSet<String>,
    summary: &mut RunSummary,
) {
    for notification in ctx.policy.decide(diff, wcif, members) {
        match ctx.sink.send(&notification).await {
            Ok(()) => {
                log::info!("Sent {} for {}", notification.kind(), diff.id);
                summary.notifications_sent += 1;
            }
            Err(e) => {
                log::warn!(
                    "Failed to send {} for {}: {}",
                    notification.kind(),
                    diff.id,
                    e
                );
                summary.notifications_failed += 1;
            }
        }
    }
}
