//! Notification gating.
//!
//! Decides which of a competition's changes are worth announcing. Rendering
//! and delivery belong to the sink.

use std::collections::HashSet;

use crate::models::{CompetitionRef, Notification, RegistrationState, Wcif, WatchConfig};
use crate::pipeline::diff::CompetitionDiff;
use crate::utils::geo::{self, Coordinates};

/// Proximity-gated announcement rules.
#[derive(Debug, Clone)]
pub struct NotificationPolicy {
    reference: Coordinates,
    radius_km: f64,
    site_url: String,
}

impl NotificationPolicy {
    pub fn new(reference: Coordinates, radius_km: f64, site_url: impl Into<String>) -> Self {
        Self {
            reference,
            radius_km,
            site_url: site_url.into(),
        }
    }

    pub fn from_config(watch: &WatchConfig, site_url: &str) -> Self {
        Self::new(watch.reference(), watch.radius_km, site_url)
    }

    /// Whether a competition's venue is within the announcement radius.
    pub fn is_near(&self, venue: Coordinates) -> bool {
        geo::is_near(self.reference, venue, self.radius_km)
    }

    /// Notifications for one competition, in delivery order:
    ///
    /// 1. a newly discovered competition near the reference point;
    /// 2. one message naming every club member who newly registered;
    /// 3. a registration state change, when the competition is near or more
    ///    than one club member newly registered. Changes back to `NotOpen`
    ///    are never announced.
    pub fn decide(
        &self,
        diff: &CompetitionDiff,
        wcif: &Wcif,
        members: &HashSet<String>,
    ) -> Vec<Notification> {
        let mut notifications = Vec::new();
        let competition = CompetitionRef::from_wcif(wcif, &self.site_url);
        let near = wcif.venue_coordinates().is_some_and(|c| self.is_near(c));
        let club = diff.club_registrations(members);

        if diff.is_new && near {
            notifications.push(Notification::NewCompetition {
                competition: competition.clone(),
                start: wcif.start_time(),
                events: wcif.events.iter().map(|e| e.id.clone()).collect(),
            });
        }

        if !club.is_empty() {
            let names = club
                .iter()
                .map(|id| wcif.person_name(id).unwrap_or(id.as_str()).to_string())
                .collect();
            notifications.push(Notification::NewRegistrants {
                competition: competition.clone(),
                names,
            });
        }

        if diff.state_changed() && (near || club.len() > 1) {
            let info = wcif.registration_info.as_ref();
            match diff.current_state {
                RegistrationState::Open => {
                    if let Some(open_time) = info.and_then(|i| i.open_time) {
                        notifications.push(Notification::RegistrationOpened {
                            competition,
                            open_time,
                        });
                    }
                }
                RegistrationState::Closing => {
                    if let Some(close_time) = info.and_then(|i| i.close_time) {
                        notifications.push(Notification::RegistrationClosing {
                            competition,
                            close_time,
                        });
                    }
                }
                RegistrationState::NotOpen => {}
            }
        }

        notifications
    }
}
