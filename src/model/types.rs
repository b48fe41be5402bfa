// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scalar kinds the converter receives already identified

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{Result, UserDataError};

/// Name of the database every project starts with
pub const DEFAULT_DATABASE_ID: &str = "(default)";

/// Identifies a database instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseId {
    /// Owning project
    pub project_id: String,
    /// Database within the project
    pub database_id: String,
}

impl DatabaseId {
    /// Create a database id
    pub fn new(project_id: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: database_id.into(),
        }
    }

    /// The `(default)` database of a project
    pub fn default_for(project_id: impl Into<String>) -> Self {
        Self::new(project_id, DEFAULT_DATABASE_ID)
    }

    /// Check if this is the project's default database
    pub fn is_default_database(&self) -> bool {
        self.database_id == DEFAULT_DATABASE_ID
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_id, self.database_id)
    }
}

/// Seconds of 0001-01-01T00:00:00Z
const MIN_SECONDS: i64 = -62_135_596_800;
/// Seconds of 9999-12-31T23:59:59Z
const MAX_SECONDS: i64 = 253_402_300_799;
const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// A point in time with nanosecond precision, independent of any calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "TimestampParts")]
pub struct Timestamp {
    seconds: i64,
    nanos: i32,
}

/// Unchecked wire form of [`Timestamp`]
#[derive(Deserialize)]
struct TimestampParts {
    seconds: i64,
    nanos: i32,
}

impl TryFrom<TimestampParts> for Timestamp {
    type Error = UserDataError;

    fn try_from(parts: TimestampParts) -> Result<Self> {
        Self::new(parts.seconds, parts.nanos)
    }
}

impl Timestamp {
    /// Create a timestamp, validating the supported range
    pub fn new(seconds: i64, nanos: i32) -> Result<Self> {
        if !(0..NANOS_PER_SECOND).contains(&nanos) {
            return Err(UserDataError::invalid_value(format!(
                "Timestamp nanoseconds out of range: {nanos}"
            )));
        }
        if !(MIN_SECONDS..=MAX_SECONDS).contains(&seconds) {
            return Err(UserDataError::invalid_value(format!(
                "Timestamp seconds out of range: {seconds}"
            )));
        }
        Ok(Self { seconds, nanos })
    }

    /// Convert a host date-time
    pub fn from_datetime(datetime: DateTime<Utc>) -> Result<Self> {
        // Leap-second representations carry nanos >= 1e9; clamp them.
        let nanos = datetime.timestamp_subsec_nanos().min(999_999_999) as i32;
        Self::new(datetime.timestamp(), nanos)
    }

    /// Seconds since the Unix epoch
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Sub-second nanoseconds
    pub fn nanos(&self) -> i32 {
        self.nanos
    }

    /// Drop precision below one microsecond
    pub fn truncated_to_micros(self) -> Self {
        Self {
            seconds: self.seconds,
            nanos: self.nanos - self.nanos % 1_000,
        }
    }

    /// Convert into a chrono date-time
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos as u32)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(datetime) => write!(f, "{}", datetime.to_rfc3339()),
            None => write!(f, "Timestamp(seconds={}, nanos={})", self.seconds, self.nanos),
        }
    }
}

/// A geographic point
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "GeoPointParts")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct GeoPointParts {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<GeoPointParts> for GeoPoint {
    type Error = UserDataError;

    fn try_from(parts: GeoPointParts) -> Result<Self> {
        Self::new(parts.latitude, parts.longitude)
    }
}

impl GeoPoint {
    /// Create a geo point, validating latitude and longitude ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(UserDataError::invalid_value(format!(
                "Latitude must be a number between -90 and 90, but was: {latitude}"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(UserDataError::invalid_value(format!(
                "Longitude must be a number between -180 and 180, but was: {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Slash-separated path of a document, e.g. `rooms/eros/messages/1`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "DocumentKeyParts")]
pub struct DocumentKey {
    segments: Vec<String>,
}

#[derive(Deserialize)]
struct DocumentKeyParts {
    segments: Vec<String>,
}

impl TryFrom<DocumentKeyParts> for DocumentKey {
    type Error = UserDataError;

    fn try_from(parts: DocumentKeyParts) -> Result<Self> {
        Self::from_segments(parts.segments)
    }
}

impl DocumentKey {
    /// Parse a document path. It needs an even, non-zero number of segments.
    pub fn from_path_string(path: &str) -> Result<Self> {
        let segments: Vec<String> = path
            .trim_matches('/')
            .split('/')
            .map(str::to_owned)
            .collect();
        Self::from_segments(segments)
    }

    /// Build a key from collection/document segments
    pub fn from_segments(segments: Vec<String>) -> Result<Self> {
        if segments.iter().any(String::is_empty) {
            return Err(UserDataError::invalid_value(format!(
                "Invalid document path '{}': segments must not be empty",
                segments.join("/")
            )));
        }
        if segments.is_empty() || segments.len() % 2 != 0 {
            return Err(UserDataError::invalid_value(format!(
                "Invalid document path '{}': document references must have an even number of segments, but it has {}",
                segments.join("/"),
                segments.len()
            )));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Id of the document, the last path segment
    pub fn document_id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// A reference to a document in some database
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentReference {
    pub database_id: DatabaseId,
    pub key: DocumentKey,
}

impl DocumentReference {
    pub fn new(database_id: DatabaseId, key: DocumentKey) -> Self {
        Self { database_id, key }
    }
}

/// Numeric operand of an increment transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// 64-bit signed integer
    Integer(i64),
    /// Double precision float
    Double(f64),
}

impl Number {
    /// Convert to f64
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Double(d) => *d,
        }
    }

    /// Check if this is an integer
    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Integer(v)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Double(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_range() {
        assert!(Timestamp::new(0, 0).is_ok());
        assert!(Timestamp::new(MIN_SECONDS, 0).is_ok());
        assert!(Timestamp::new(MAX_SECONDS, 999_999_999).is_ok());
        assert!(Timestamp::new(MAX_SECONDS + 1, 0).is_err());
        assert!(Timestamp::new(0, -1).is_err());
        assert!(Timestamp::new(0, 1_000_000_000).is_err());
    }

    #[test]
    fn test_timestamp_truncation() {
        let ts = Timestamp::new(10, 123_456_789).unwrap();
        assert_eq!(ts.truncated_to_micros().nanos(), 123_456_000);
        assert_eq!(ts.truncated_to_micros().seconds(), 10);
    }

    #[test]
    fn test_timestamp_from_datetime() {
        let datetime = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let ts = Timestamp::from_datetime(datetime).unwrap();
        assert_eq!(ts.seconds(), datetime.timestamp());
        assert_eq!(ts.to_datetime(), Some(datetime));
    }

    #[test]
    fn test_geo_point_ranges() {
        assert!(GeoPoint::new(90.0, -180.0).is_ok());
        assert!(GeoPoint::new(90.5, 0.0).is_err());
        assert!(GeoPoint::new(0.0, 181.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_document_key() {
        let key = DocumentKey::from_path_string("rooms/eros").unwrap();
        assert_eq!(key.document_id(), "eros");
        assert_eq!(key.to_string(), "rooms/eros");

        assert!(DocumentKey::from_path_string("rooms").is_err());
        assert!(DocumentKey::from_path_string("rooms//eros").is_err());
        assert!(DocumentKey::from_path_string("").is_err());
    }

    #[test]
    fn test_deserialization_validates() {
        let ts: Timestamp = serde_json::from_str(r#"{"seconds":10,"nanos":5}"#).unwrap();
        assert_eq!(ts, Timestamp::new(10, 5).unwrap());
        let out_of_range = r#"{"seconds":999999999999999,"nanos":-7}"#;
        assert!(serde_json::from_str::<Timestamp>(out_of_range).is_err());
        assert!(serde_json::from_str::<Timestamp>(r#"{"seconds":0,"nanos":1000000000}"#).is_err());

        let point: GeoPoint = serde_json::from_str(r#"{"latitude":1.5,"longitude":-2.5}"#).unwrap();
        assert_eq!(point, GeoPoint::new(1.5, -2.5).unwrap());
        let err = serde_json::from_str::<GeoPoint>(r#"{"latitude":500.0,"longitude":-999.0}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Latitude must be a number between -90 and 90"));

        let key: DocumentKey = serde_json::from_str(r#"{"segments":["rooms","eros"]}"#).unwrap();
        assert_eq!(key.to_string(), "rooms/eros");
        assert!(serde_json::from_str::<DocumentKey>(r#"{"segments":["rooms"]}"#).is_err());
        assert!(serde_json::from_str::<DocumentKey>(r#"{"segments":["rooms",""]}"#).is_err());
    }

    #[test]
    fn test_database_id_display() {
        let id = DatabaseId::default_for("proj");
        assert!(id.is_default_database());
        assert_eq!(id.to_string(), "proj/(default)");
    }
}
