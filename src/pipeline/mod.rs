//! Watch pipeline.
//!
//! - `classify`: registration window state at a point in time
//! - `diff`: comparison against the prior snapshot
//! - `policy`: which changes become notifications
//! - `watch`: one end-to-end pass

pub mod classify;
pub mod diff;
pub mod policy;
pub mod watch;

pub use classify::{classify, registration_state};
pub use diff::{CompetitionDiff, DiffEngine, DiffResult};
pub use policy::NotificationPolicy;
pub use watch::{RunSummary, WatchContext, run_watch};
