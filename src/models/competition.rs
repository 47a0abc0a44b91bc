// src/models/competition.rs

//! Competition detail (WCIF) and the trimmed record persisted between runs.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::geo::Coordinates;

/// Subset of the public WCIF payload the watcher consumes.
///
/// Unknown fields are ignored, so the raw payload can grow without breaking
/// decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wcif {
    pub id: String,

    pub name: String,

    pub schedule: Schedule,

    #[serde(default)]
    pub events: Vec<WcifEvent>,

    #[serde(default)]
    pub persons: Vec<Person>,

    #[serde(default)]
    pub registration_info: Option<RegistrationInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub start_date: NaiveDate,

    #[serde(default)]
    pub venues: Vec<Venue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub latitude_microdegrees: i64,
    pub longitude_microdegrees: i64,

    /// IANA zone name, e.g. `America/Los_Angeles`
    #[serde(default)]
    pub timezone: String,
}

impl Venue {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::from_microdegrees(self.latitude_microdegrees, self.longitude_microdegrees)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WcifEvent {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: String,

    /// Newcomers have no WCA id until their first competition.
    #[serde(default)]
    pub wca_id: Option<String>,
}

/// Registration window as published in the WCIF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInfo {
    #[serde(default)]
    pub open_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub close_time: Option<DateTime<Utc>>,
}

impl Wcif {
    /// Coordinates of the first venue, if the schedule lists one.
    pub fn venue_coordinates(&self) -> Option<Coordinates> {
        self.schedule.venues.first().map(Venue::coordinates)
    }

    /// Display name of the person registered under `wca_id`.
    pub fn person_name(&self, wca_id: &str) -> Option<&str> {
        self.persons
            .iter()
            .find(|p| p.wca_id.as_deref() == Some(wca_id))
            .map(|p| p.name.as_str())
    }

    /// Local midnight of the start date in the first venue's timezone.
    ///
    /// An unknown or missing zone falls back to UTC. When midnight falls in a
    /// DST gap, the first valid local instant after it is used.
    pub fn start_time(&self) -> DateTime<Utc> {
        let midnight = self.schedule.start_date.and_time(NaiveTime::MIN);
        let zone = self
            .schedule
            .venues
            .first()
            .and_then(|v| v.timezone.parse::<Tz>().ok());

        let Some(zone) = zone else {
            log::debug!("{}: no usable venue timezone, using UTC", self.id);
            return midnight.and_utc();
        };

        (0..=2)
            .find_map(|hour| {
                zone.from_local_datetime(&(midnight + Duration::hours(hour)))
                    .earliest()
            })
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    }

    /// Public page of the competition on the given site.
    pub fn url(&self, site_url: &str) -> String {
        format!("{}/competitions/{}", site_url.trim_end_matches('/'), self.id)
    }
}

/// Trimmed competition record kept in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionRecord {
    pub id: String,

    pub start_date: NaiveDate,

    /// Degrees
    pub latitude: f64,

    /// Degrees
    pub longitude: f64,

    pub events: Vec<String>,

    /// WCA ids of registered persons.
    #[serde(default)]
    pub registrations: Vec<String>,
}

impl CompetitionRecord {
    /// Trim a WCIF payload into a snapshot record.
    ///
    /// Fails when the schedule has no venue, since proximity cannot be
    /// decided without one.
    pub fn from_wcif(wcif: &Wcif) -> Result<Self> {
        let venue = wcif
            .venue_coordinates()
            .ok_or_else(|| AppError::malformed(&wcif.id, "schedule has no venues"))?;

        Ok(Self {
            id: wcif.id.clone(),
            start_date: wcif.schedule.start_date,
            latitude: venue.latitude,
            longitude: venue.longitude,
            events: wcif.events.iter().map(|e| e.id.clone()).collect(),
            registrations: wcif
                .persons
                .iter()
                .filter_map(|p| p.wca_id.clone())
                .collect(),
        })
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}
