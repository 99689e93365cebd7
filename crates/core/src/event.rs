//! Detection events as delivered by the real-time feed.
//!
//! The feed stores loosely typed JSON records. They are parsed into a
//! [`RawEvent`] at the adapter boundary so nothing downstream ever handles a
//! generic map. [`RawEvent::validate`] is the reconciler's own gate and is
//! also applied to events submitted through the HTTP API.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Field names used by the feed records.
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_PERSON_HASH: &str = "person_hash";
pub const FIELD_CAMERA_ID: &str = "camera_id";
pub const FIELD_ID: &str = "id";

/// One observation of a person by a camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Opaque identifier assigned by the feed (the record key), if known.
    #[serde(default)]
    pub id: Option<String>,
    /// Event time in unix seconds.
    pub timestamp: i64,
    pub person_hash: String,
    pub camera_id: String,
}

impl RawEvent {
    /// Parse a feed record.
    ///
    /// `key` is the record's key in the feed and takes precedence over an
    /// `id` field embedded in the record. Fractional timestamps are truncated
    /// to whole seconds.
    pub fn from_feed(key: Option<&str>, value: &serde_json::Value) -> Result<Self, CoreError> {
        let obj = value
            .as_object()
            .ok_or_else(|| CoreError::Validation("Feed record must be a JSON object".into()))?;

        let timestamp = feed_timestamp(value).ok_or_else(|| {
            CoreError::Validation(format!("Missing or non-numeric '{FIELD_TIMESTAMP}'"))
        })?;

        let person_hash = require_str(obj, FIELD_PERSON_HASH)?;
        let camera_id = require_str(obj, FIELD_CAMERA_ID)?;

        let id = key
            .map(str::to_string)
            .or_else(|| obj.get(FIELD_ID).and_then(|v| v.as_str()).map(str::to_string))
            .filter(|id| !id.is_empty());

        let event = Self {
            id,
            timestamp,
            person_hash,
            camera_id,
        };
        event.validate()?;
        Ok(event)
    }

    /// Check the required fields are present and usable.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.person_hash.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "'{FIELD_PERSON_HASH}' must not be empty"
            )));
        }
        if self.camera_id.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "'{FIELD_CAMERA_ID}' must not be empty"
            )));
        }
        if self.timestamp < 0 {
            return Err(CoreError::Validation(format!(
                "'{FIELD_TIMESTAMP}' must not be negative, got {}",
                self.timestamp
            )));
        }
        self.detected_at().map(|_| ())
    }

    /// The event time as a UTC timestamp.
    pub fn detected_at(&self) -> Result<Timestamp, CoreError> {
        DateTime::from_timestamp(self.timestamp, 0).ok_or_else(|| {
            CoreError::Validation(format!(
                "'{FIELD_TIMESTAMP}' {} is out of range",
                self.timestamp
            ))
        })
    }
}

/// Read the numeric timestamp of a feed record without parsing the rest.
///
/// The adapter uses this to move its watermark past records that fail full
/// parsing.
pub fn feed_timestamp(value: &serde_json::Value) -> Option<i64> {
    let ts = value.get(FIELD_TIMESTAMP)?;
    ts.as_i64().or_else(|| ts.as_f64().map(|f| f.trunc() as i64))
}

fn require_str(
    obj: &serde_json::Map<String, serde_json::Value>,
    field: &str,
) -> Result<String, CoreError> {
    match obj.get(field).and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(CoreError::Validation(format!(
            "Missing or empty string field '{field}'"
        ))),
    }
}
