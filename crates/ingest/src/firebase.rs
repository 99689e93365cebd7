//! Firebase Realtime Database adapter.
//!
//! Reads detection records over the REST API using [`reqwest`]. Records live
//! under one path as an object keyed by push id; the key becomes the event's
//! external id.

use std::time::Duration;

use async_trait::async_trait;
use manta_core::event::{feed_timestamp, RawEvent, FIELD_TIMESTAMP};
use serde_json::Value;

use crate::error::SourceError;
use crate::source::{EventSource, FeedRecord};

/// REST client for one Realtime Database instance.
pub struct FirebaseEventSource {
    client: reqwest::Client,
    database_url: String,
    auth_token: Option<String>,
}

impl FirebaseEventSource {
    /// Create a client for `database_url`, e.g. `https://project.firebaseio.com`.
    pub fn new(
        database_url: &str,
        auth_token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self::with_client(client, database_url, auth_token))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        database_url: &str,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            client,
            database_url: database_url.trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    /// `{database_url}/{path}.json`
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}.json", self.database_url, path.trim_matches('/'))
    }

    /// Run an ordered-by-timestamp query with extra filter parameters.
    async fn query(
        &self,
        path: &str,
        filter: &[(&str, String)],
    ) -> Result<Vec<FeedRecord>, SourceError> {
        let mut request = self
            .client
            .get(self.endpoint(path))
            .query(&[("orderBy", format!("\"{FIELD_TIMESTAMP}\""))])
            .query(filter);
        if let Some(token) = &self.auth_token {
            request = request.query(&[("auth", token)]);
        }

        let response = Self::ensure_success(request.send().await?).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        parse_records(body)
    }

    /// Map 401/403 to [`SourceError::Unauthorized`] and other non-2xx
    /// statuses to [`SourceError::Api`].
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SourceError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SourceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl EventSource for FirebaseEventSource {
    async fn recent(&self, path: &str, limit: usize) -> Result<Vec<FeedRecord>, SourceError> {
        let mut records = self
            .query(path, &[("limitToLast", limit.to_string())])
            .await?;
        records.sort_by_key(|r| r.timestamp().unwrap_or(i64::MIN));
        Ok(records)
    }

    async fn fetch_since(
        &self,
        path: &str,
        watermark: i64,
    ) -> Result<Vec<FeedRecord>, SourceError> {
        self.query(path, &[("startAt", watermark.to_string())]).await
    }
}

/// Parse a query response body into feed records.
///
/// An empty path comes back as `null`. Paths whose keys look like array
/// indices come back as a JSON array with `null` holes.
pub(crate) fn parse_records(body: Value) -> Result<Vec<FeedRecord>, SourceError> {
    let entries: Vec<(String, Value)> = match body {
        Value::Null => Vec::new(),
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => {
            return Err(SourceError::Decode(format!(
                "expected an object of records, got {other}"
            )))
        }
    };

    Ok(entries
        .into_iter()
        .map(|(key, value)| match RawEvent::from_feed(Some(&key), &value) {
            Ok(event) => FeedRecord::Event(event),
            Err(e) => FeedRecord::Malformed {
                timestamp: feed_timestamp(&value),
                key,
                reason: e.to_string(),
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn endpoint_joins_path() {
        let source = FirebaseEventSource::with_client(
            reqwest::Client::new(),
            "https://demo.firebaseio.com/",
            None,
        );
        assert_eq!(source.endpoint("/logs/"), "https://demo.firebaseio.com/logs.json");
        assert_eq!(source.endpoint("site/a/logs"), "https://demo.firebaseio.com/site/a/logs.json");
    }

    #[test]
    fn null_body_is_empty() {
        assert!(parse_records(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn object_keys_become_ids() {
        let body = json!({
            "-Nx1": {"timestamp": 100, "person_hash": "h1", "camera_id": "c1"},
        });
        let records = parse_records(body).unwrap();
        assert_matches!(
            records.as_slice(),
            [FeedRecord::Event(e)] if e.id.as_deref() == Some("-Nx1") && e.timestamp == 100
        );
    }

    #[test]
    fn malformed_records_keep_their_timestamp() {
        let body = json!({
            "bad": {"timestamp": 42, "camera_id": "c1"},
            "worse": {"person_hash": "h1"},
        });
        let mut records = parse_records(body).unwrap();
        records.sort_by_key(|r| r.identity());
        assert_matches!(
            &records[0],
            FeedRecord::Malformed { key, timestamp: Some(42), .. } if key == "bad"
        );
        assert_matches!(&records[1], FeedRecord::Malformed { timestamp: None, .. });
    }

    #[test]
    fn array_body_skips_holes() {
        let body = json!([null, {"timestamp": 5, "person_hash": "h", "camera_id": "c"}]);
        let records = parse_records(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity(), "1");
    }

    #[test]
    fn scalar_body_is_decode_error() {
        assert_matches!(parse_records(json!("nope")), Err(SourceError::Decode(_)));
    }
}
