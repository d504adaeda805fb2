// src/lib.rs
//! GPS Geofence Library
//!
//! Turns a raw NMEA byte stream into averaged positions, matches them against
//! a list of named waypoints and produces status notifications.

pub mod config;
pub mod error;
pub mod geofence;
pub mod gps;
pub mod notify;
pub mod serial;
pub mod session;

// Re-export main types for convenience
pub use error::{GeofenceError, Result};
pub use geofence::{check_location, distance_m, GeofenceResult, Waypoint};
pub use gps::{Fix, FixSampler, Position, SamplerSettings};
pub use notify::{Notification, Notifier};
pub use session::{Session, SessionState};
