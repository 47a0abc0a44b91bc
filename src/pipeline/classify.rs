//! Registration window classification.

use chrono::{DateTime, Duration, Utc};

use crate::models::{RegistrationInfo, RegistrationState};

/// Classify `now` against a registration window.
///
/// - before `open`: [`RegistrationState::NotOpen`]
/// - at most `closing_window` before `close`, or past it: [`RegistrationState::Closing`]
/// - otherwise: [`RegistrationState::Open`]
///
/// A window with `open > close` is not meaningful; it still classifies
/// (`NotOpen` before `open`, `Closing` after) without panicking.
pub fn classify(
    now: DateTime<Utc>,
    open: DateTime<Utc>,
    close: DateTime<Utc>,
    closing_window: Duration,
) -> RegistrationState {
    if now < open {
        RegistrationState::NotOpen
    } else if close - now <= closing_window {
        RegistrationState::Closing
    } else {
        RegistrationState::Open
    }
}

/// Classify a WCIF registration window. Missing data counts as not open.
pub fn registration_state(
    info: Option<&RegistrationInfo>,
    now: DateTime<Utc>,
    closing_window: Duration,
) -> RegistrationState {
    match info.and_then(|i| i.open_time.zip(i.close_time)) {
        Some((open, close)) => classify(now, open, close, closing_window),
        None => RegistrationState::NotOpen,
    }
}
