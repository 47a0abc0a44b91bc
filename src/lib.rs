// src/lib.rs

//! compwatch: watches the WCA competition registry and announces nearby
//! competitions, club registrations and registration windows.

pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
