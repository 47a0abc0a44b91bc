//! Notification payloads handed to a sink.
//!
//! These carry what happened and to which competition. Turning them into
//! message text is the sink's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Wcif;

/// Identity of the competition a notification refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionRef {
    pub id: String,
    pub name: String,
    pub url: String,
}

impl CompetitionRef {
    pub fn from_wcif(wcif: &Wcif, site_url: &str) -> Self {
        Self {
            id: wcif.id.clone(),
            name: wcif.name.clone(),
            url: wcif.url(site_url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A nearby competition was announced.
    NewCompetition {
        competition: CompetitionRef,
        /// Local midnight of the first day at the venue
        start: DateTime<Utc>,
        events: Vec<String>,
    },
    /// Club members registered since the last run.
    NewRegistrants {
        competition: CompetitionRef,
        names: Vec<String>,
    },
    RegistrationOpened {
        competition: CompetitionRef,
        open_time: DateTime<Utc>,
    },
    RegistrationClosing {
        competition: CompetitionRef,
        close_time: DateTime<Utc>,
    },
}

impl Notification {
    pub fn competition(&self) -> &CompetitionRef {
        match self {
            Notification::NewCompetition { competition, .. }
            | Notification::NewRegistrants { competition, .. }
            | Notification::RegistrationOpened { competition, .. }
            | Notification::RegistrationClosing { competition, .. } => competition,
        }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::NewCompetition { .. } => "new_competition",
            Notification::NewRegistrants { .. } => "new_registrants",
            Notification::RegistrationOpened { .. } => "registration_opened",
            Notification::RegistrationClosing { .. } => "registration_closing",
        }
    }
}
