// src/error.rs
//! Error types for the geofence daemon

use std::fmt;

pub type Result<T> = std::result::Result<T, GeofenceError>;

#[derive(Debug)]
pub enum GeofenceError {
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Json(serde_json::Error),
    Connection(String),
    Config(String),
}

impl fmt::Display for GeofenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeofenceError::Io(e) => write!(f, "IO error: {}", e),
            GeofenceError::Serial(e) => write!(f, "Serial error: {}", e),
            GeofenceError::Json(e) => write!(f, "JSON error: {}", e),
            GeofenceError::Connection(msg) => write!(f, "Connection error: {}", msg),
            GeofenceError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for GeofenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeofenceError::Io(e) => Some(e),
            GeofenceError::Serial(e) => Some(e),
            GeofenceError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GeofenceError {
    fn from(error: std::io::Error) -> Self {
        GeofenceError::Io(error)
    }
}

impl From<tokio_serial::Error> for GeofenceError {
    fn from(error: tokio_serial::Error) -> Self {
        GeofenceError::Serial(error)
    }
}

impl From<serde_json::Error> for GeofenceError {
    fn from(error: serde_json::Error) -> Self {
        GeofenceError::Json(error)
    }
}
