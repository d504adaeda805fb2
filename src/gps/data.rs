// src/gps/data.rs
//! Position data structures

use chrono::{DateTime, Utc};

/// One decoded, validity-flagged position reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// UTC time reported by the receiver, when the sentence carried one
    pub timestamp: Option<DateTime<Utc>>,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Mean of a batch of fixes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub samples: usize,
}

impl Position {
    /// Average latitudes and longitudes independently. Returns `None` for an
    /// empty batch.
    pub fn average(fixes: &[Fix]) -> Option<Self> {
        if fixes.is_empty() {
            return None;
        }

        let count = fixes.len() as f64;
        let lat_sum: f64 = fixes.iter().map(|f| f.latitude).sum();
        let lon_sum: f64 = fixes.iter().map(|f| f.longitude).sum();

        Some(Self {
            latitude: lat_sum / count,
            longitude: lon_sum / count,
            samples: fixes.len(),
        })
    }
}
