//! Network-facing services.
//!
//! - `fetcher`: retrying JSON GET with a flat throttle
//! - `competitions`: competition index crawler and WCIF detail client
//! - `directory`: membership directory backends

pub mod competitions;
pub mod directory;
pub mod fetcher;

pub use competitions::CompetitionApi;
pub use directory::{MembershipDirectory, StaticDirectory, SupabaseDirectory};
pub use fetcher::{AttemptError, FetchFailure, ResilientFetcher};
