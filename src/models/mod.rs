// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod competition;
mod config;
mod notification;
mod registration;

// Re-export all public types
pub use competition::{
    CompetitionRecord, Person, RegistrationInfo, Schedule, Venue, Wcif, WcifEvent,
};
pub use config::{ApiConfig, Config, DirectoryConfig, DiscordConfig, StorageConfig, WatchConfig};
pub use notification::{CompetitionRef, Notification};
pub use registration::{RegistrationState, RegistrationStateEntry};
