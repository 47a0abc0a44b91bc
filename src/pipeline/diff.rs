//! Diff calculation against the prior snapshot.
//!
//! Each freshly fetched competition is compared with what the last run
//! persisted: whether it is new, which registrants were added, and whether
//! its registration state moved. Per-competition results are assembled into
//! one [`DiffResult`] at the end of the run.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{CompetitionRecord, RegistrationState, RegistrationStateEntry};
use crate::storage::Snapshot;

/// Changes found for one competition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionDiff {
    pub id: String,
    /// Id was absent from the prior snapshot
    pub is_new: bool,
    /// Registrants not present last run, in current order
    pub new_registrations: Vec<String>,
    /// Persisted state, `NotOpen` when none was stored
    pub previous_state: RegistrationState,
    pub current_state: RegistrationState,
}

impl CompetitionDiff {
    pub fn state_changed(&self) -> bool {
        self.previous_state != self.current_state
    }

    /// New registrants who are club members.
    pub fn club_registrations(&self, members: &HashSet<String>) -> Vec<String> {
        self.new_registrations
            .iter()
            .filter(|id| members.contains(*id))
            .cloned()
            .collect()
    }
}

/// Run-level diff persisted alongside the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Competition ids first seen this run, in listing order
    pub new_competition_ids: Vec<String>,
    /// Competition id to registrants added this run (non-empty entries only)
    pub new_registrations: BTreeMap<String, Vec<String>>,
    /// Competitions whose registration state changed, with the new state
    pub state_changes: Vec<RegistrationStateEntry>,
}

impl DiffResult {
    /// Assemble the run-level result from per-competition diffs.
    pub fn assemble(diffs: &[CompetitionDiff]) -> Self {
        let mut result = Self::default();

        for diff in diffs {
            if diff.is_new {
                result.new_competition_ids.push(diff.id.clone());
            }
            if !diff.new_registrations.is_empty() {
                result
                    .new_registrations
                    .insert(diff.id.clone(), diff.new_registrations.clone());
            }
            if diff.state_changed() {
                result
                    .state_changes
                    .push(RegistrationStateEntry::new(&diff.id, diff.current_state));
            }
        }

        result
    }

    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.new_competition_ids.is_empty()
            || !self.new_registrations.is_empty()
            || !self.state_changes.is_empty()
    }

    /// Total number of newly added registrants across competitions.
    pub fn new_registration_count(&self) -> usize {
        self.new_registrations.values().map(Vec::len).sum()
    }
}

/// Compares fetched competitions against an indexed prior snapshot.
#[derive(Debug, Clone)]
pub struct DiffEngine<'a> {
    previous: HashMap<&'a str, &'a CompetitionRecord>,
    previous_states: HashMap<&'a str, RegistrationState>,
}

impl<'a> DiffEngine<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            previous: snapshot
                .competitions
                .iter()
                .map(|c| (c.id.as_str(), c))
                .collect(),
            previous_states: snapshot
                .registration_states
                .iter()
                .map(|s| (s.id.as_str(), s.state))
                .collect(),
        }
    }

    /// Compare one competition, already classified, with the snapshot.
    pub fn compare(
        &self,
        current: &CompetitionRecord,
        current_state: RegistrationState,
    ) -> CompetitionDiff {
        let prior = self.previous.get(current.id.as_str());

        let prior_registrations: HashSet<&str> = prior
            .map(|c| c.registrations.iter().map(String::as_str).collect())
            .unwrap_or_default();

        let new_registrations = current
            .registrations
            .iter()
            .filter(|id| !prior_registrations.contains(id.as_str()))
            .cloned()
            .collect();

        let previous_state = self
            .previous_states
            .get(current.id.as_str())
            .copied()
            .unwrap_or_default();

        CompetitionDiff {
            id: current.id.clone(),
            is_new: prior.is_none(),
            new_registrations,
            previous_state,
            current_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_record(id: &str, registrations: &[&str]) -> CompetitionRecord {
        CompetitionRecord {
            id: id.to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 11, 14).unwrap(),
            latitude: 38.5,
            longitude: -121.7,
            events: vec!["333".into()],
            registrations: registrations.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn snapshot(records: Vec<CompetitionRecord>, states: &[(&str, RegistrationState)]) -> Snapshot {
        Snapshot {
            competitions: records,
            registration_states: states
                .iter()
                .map(|(id, s)| RegistrationStateEntry::new(*id, *s))
                .collect(),
        }
    }

    #[test]
    fn test_no_changes() {
        let prev = snapshot(
            vec![make_record("A", &["X", "Y"])],
            &[("A", RegistrationState::Open)],
        );
        let engine = DiffEngine::new(&prev);

        let diff = engine.compare(&make_record("A", &["X", "Y"]), RegistrationState::Open);
        assert!(!diff.is_new);
        assert!(diff.new_registrations.is_empty());
        assert!(!diff.state_changed());
        assert!(!DiffResult::assemble(&[diff]).has_changes());
    }

    #[test]
    fn test_added_registrant() {
        let prev = snapshot(vec![make_record("A", &["A1", "B1"])], &[]);
        let engine = DiffEngine::new(&prev);

        let diff = engine.compare(
            &make_record("A", &["A1", "B1", "C1"]),
            RegistrationState::NotOpen,
        );
        assert_eq!(diff.new_registrations, vec!["C1"]);
    }

    #[test]
    fn test_new_competition_takes_all_registrants() {
        let prev = Snapshot::default();
        let engine = DiffEngine::new(&prev);

        let diff = engine.compare(&make_record("A", &["A1", "B1"]), RegistrationState::NotOpen);
        assert!(diff.is_new);
        assert_eq!(diff.new_registrations, vec!["A1", "B1"]);
    }

    #[test]
    fn test_withdrawn_registrant_is_not_reported() {
        let prev = snapshot(vec![make_record("A", &["A1", "B1"])], &[]);
        let engine = DiffEngine::new(&prev);

        let diff = engine.compare(&make_record("A", &["A1"]), RegistrationState::NotOpen);
        assert!(diff.new_registrations.is_empty());
    }

    #[test]
    fn test_missing_state_defaults_to_not_open() {
        let prev = snapshot(vec![make_record("A", &[])], &[]);
        let engine = DiffEngine::new(&prev);

        let unchanged = engine.compare(&make_record("A", &[]), RegistrationState::NotOpen);
        assert_eq!(unchanged.previous_state, RegistrationState::NotOpen);
        assert!(!unchanged.state_changed());

        let opened = engine.compare(&make_record("A", &[]), RegistrationState::Open);
        assert!(opened.state_changed());
    }

    #[test]
    fn test_backward_transition_is_recorded() {
        let prev = snapshot(vec![make_record("A", &[])], &[("A", RegistrationState::Closing)]);
        let engine = DiffEngine::new(&prev);

        let diff = engine.compare(&make_record("A", &[]), RegistrationState::Open);
        assert!(diff.state_changed());
        assert_eq!(diff.previous_state, RegistrationState::Closing);
    }

    #[test]
    fn test_club_registrations() {
        let prev = snapshot(vec![make_record("A", &["M1"])], &[]);
        let engine = DiffEngine::new(&prev);
        let members: HashSet<String> = ["M1", "M2", "M3"].iter().map(|s| s.to_string()).collect();

        let diff = engine.compare(
            &make_record("A", &["M1", "X1", "M2", "M3"]),
            RegistrationState::Open,
        );
        assert_eq!(diff.club_registrations(&members), vec!["M2", "M3"]);
    }

    #[test]
    fn test_assemble_mixed_changes() {
        let prev = snapshot(
            vec![make_record("A", &["A1"]), make_record("B", &["B1"])],
            &[("A", RegistrationState::NotOpen), ("B", RegistrationState::Open)],
        );
        let engine = DiffEngine::new(&prev);

        let diffs = vec![
            engine.compare(&make_record("A", &["A1", "A2"]), RegistrationState::Open),
            engine.compare(&make_record("B", &["B1"]), RegistrationState::Open),
            engine.compare(&make_record("C", &[]), RegistrationState::NotOpen),
        ];
        let result = DiffResult::assemble(&diffs);

        assert_eq!(result.new_competition_ids, vec!["C"]);
        assert_eq!(result.new_registrations.len(), 1);
        assert_eq!(result.new_registrations["A"], vec!["A2"]);
        assert_eq!(
            result.state_changes,
            vec![RegistrationStateEntry::new("A", RegistrationState::Open)]
        );
        assert_eq!(result.new_registration_count(), 1);
    }

    #[test]
    fn test_empty_to_full() {
        let prev = Snapshot::default();
        let engine = DiffEngine::new(&prev);

        let result = DiffResult::assemble(&[
            engine.compare(&make_record("A", &[]), RegistrationState::NotOpen),
            engine.compare(&make_record("B", &["B1"]), RegistrationState::NotOpen),
        ]);
        assert_eq!(result.new_competition_ids, vec!["A", "B"]);
        assert!(result.state_changes.is_empty());
    }
}
