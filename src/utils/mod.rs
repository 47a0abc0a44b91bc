//! Utility functions and helpers.

pub mod geo;
pub mod http;
pub mod log;
