// src/models/registration.rs

//! Registration window state persisted per competition.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of `now` relative to a competition's registration window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistrationState {
    #[default]
    NotOpen,
    Open,
    Closing,
}

impl RegistrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationState::NotOpen => "notOpen",
            RegistrationState::Open => "open",
            RegistrationState::Closing => "closing",
        }
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{id, state}` pair as stored in `regState.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationStateEntry {
    pub id: String,
    pub state: RegistrationState,
}

impl RegistrationStateEntry {
    pub fn new(id: impl Into<String>, state: RegistrationState) -> Self {
        Self {
            id: id.into(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serialization() {
        let entry = RegistrationStateEntry::new("DavisOpen2026", RegistrationState::NotOpen);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"id":"DavisOpen2026","state":"notOpen"}"#);

        let parsed: RegistrationStateEntry =
            serde_json::from_str(r#"{"id":"X","state":"closing"}"#).unwrap();
        assert_eq!(parsed.state, RegistrationState::Closing);
    }

    #[test]
    fn test_default_is_not_open() {
        assert_eq!(RegistrationState::default(), RegistrationState::NotOpen);
        assert_eq!(RegistrationState::Open.to_string(), "open");
    }
}
