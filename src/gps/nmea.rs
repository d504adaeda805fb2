// src/gps/nmea.rs
//! NMEA RMC sentence decoding

use super::data::Fix;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;

/// Talker/type prefixes of the recommended-minimum sentence we consume
const RMC_PREFIXES: [&str; 2] = ["$GPRMC", "$GNRMC"];

/// Minimum field count to reach the longitude hemisphere
const MIN_FIELDS: usize = 7;

/// Why a sentence did not produce a fix
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Not an RMC sentence; ignored rather than malformed
    NotRmc,
    TooFewFields(usize),
    /// Receiver flagged the fix as void (`V`) or sent an unknown status
    Void(String),
    InvalidLatitude,
    InvalidLongitude,
    OutOfRange { latitude: f64, longitude: f64 },
}

impl DecodeError {
    /// True for rejections caused by broken input rather than receiver state
    pub fn is_malformed(&self) -> bool {
        !matches!(self, DecodeError::NotRmc | DecodeError::Void(_))
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NotRmc => write!(f, "not an RMC sentence"),
            DecodeError::TooFewFields(n) => write!(f, "too few fields ({})", n),
            DecodeError::Void(flag) => write!(f, "no active fix (status {:?})", flag),
            DecodeError::InvalidLatitude => write!(f, "invalid latitude"),
            DecodeError::InvalidLongitude => write!(f, "invalid longitude"),
            DecodeError::OutOfRange { latitude, longitude } => {
                write!(f, "coordinates out of range ({}, {})", latitude, longitude)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Returns true if the line is a GPS or GNSS RMC sentence
pub fn is_rmc(line: &str) -> bool {
    RMC_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// Decode a sentence into a fix, discarding the rejection reason
pub fn decode(sentence: &str) -> Option<Fix> {
    classify(sentence).ok()
}

/// Decode a sentence, reporting why it was rejected
pub fn classify(sentence: &str) -> Result<Fix, DecodeError> {
    // Drop the checksum; it is not verified
    let body = sentence.split('*').next().unwrap_or(sentence);
    if !is_rmc(body) {
        return Err(DecodeError::NotRmc);
    }

    let parts: Vec<&str> = body.split(',').collect();
    if parts.len() < MIN_FIELDS {
        return Err(DecodeError::TooFewFields(parts.len()));
    }

    // Status (field 2): A = active, V = void
    if parts[2] != "A" {
        return Err(DecodeError::Void(parts[2].to_string()));
    }

    let latitude = nmea_to_decimal(parts[3], parts[4]).ok_or(DecodeError::InvalidLatitude)?;
    let longitude = nmea_to_decimal(parts[5], parts[6]).ok_or(DecodeError::InvalidLongitude)?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(DecodeError::OutOfRange { latitude, longitude });
    }

    // Time (field 1) and date (field 9) are informational only
    let timestamp = parts
        .get(9)
        .and_then(|date| parse_timestamp(parts[1], date));

    Ok(Fix::new(latitude, longitude).with_timestamp(timestamp))
}

/// Convert an NMEA `DDDMM.MMMM` coordinate to decimal degrees.
///
/// Empty or non-numeric input gives `None`. `S` and `W` hemispheres negate
/// the result.
pub fn nmea_to_decimal(value: &str, hemisphere: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }

    let raw = value.parse::<f64>().ok()?;
    let degrees = (raw / 100.0).floor();
    let minutes = raw - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;

    if hemisphere == "S" || hemisphere == "W" {
        Some(-decimal)
    } else {
        Some(decimal)
    }
}

/// Combine `hhmmss[.sss]` and `ddmmyy` into a UTC timestamp
fn parse_timestamp(time: &str, date: &str) -> Option<DateTime<Utc>> {
    if date.len() != 6 {
        return None;
    }

    let hour = time.get(0..2)?.parse::<u32>().ok()?;
    let minute = time.get(2..4)?.parse::<u32>().ok()?;
    let second = time.get(4..6)?.parse::<u32>().ok()?;
    let millis = match time.get(6..)? {
        "" => 0,
        frac => (frac.parse::<f64>().ok()? * 1000.0).round() as u32,
    };

    let day = date.get(0..2)?.parse::<u32>().ok()?;
    let month = date.get(2..4)?.parse::<u32>().ok()?;
    let year = date.get(4..6)?.parse::<i32>().ok()?;
    // Two-digit year, pivot at 1980
    let year = if year < 80 { 2000 + year } else { 1900 + year };

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?;
    Some(date.and_time(time).and_utc())
}
