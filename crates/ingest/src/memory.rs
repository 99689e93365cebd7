//! In-process [`EventSource`] holding records in memory.
//!
//! Used by tests and local development in place of the real feed.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use manta_core::event::RawEvent;

use crate::error::SourceError;
use crate::source::{EventSource, FeedRecord};

#[derive(Default)]
pub struct MemoryEventSource {
    records: Mutex<Vec<FeedRecord>>,
    /// Status codes returned by the next fetches, in order.
    failures: Mutex<VecDeque<u16>>,
}

impl MemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: RawEvent) {
        self.push_record(FeedRecord::Event(event));
    }

    pub fn push_record(&self, record: FeedRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }

    /// Make the next fetch fail with the given HTTP status.
    pub fn fail_next(&self, status: u16) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(status);
    }

    fn take_failure(&self) -> Result<(), SourceError> {
        let status = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match status {
            None => Ok(()),
            Some(status @ (401 | 403)) => Err(SourceError::Unauthorized { status }),
            Some(status) => Err(SourceError::Api {
                status,
                body: "injected failure".to_string(),
            }),
        }
    }

    fn sorted(&self) -> Vec<FeedRecord> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        records.sort_by_key(|r| r.timestamp().unwrap_or(i64::MIN));
        records
    }
}

#[async_trait]
impl EventSource for MemoryEventSource {
    async fn recent(&self, _path: &str, limit: usize) -> Result<Vec<FeedRecord>, SourceError> {
        self.take_failure()?;
        let records = self.sorted();
        let skip = records.len().saturating_sub(limit);
        Ok(records.into_iter().skip(skip).collect())
    }

    async fn fetch_since(
        &self,
        _path: &str,
        watermark: i64,
    ) -> Result<Vec<FeedRecord>, SourceError> {
        self.take_failure()?;
        Ok(self
            .sorted()
            .into_iter()
            .filter(|r| r.timestamp().is_some_and(|ts| ts >= watermark))
            .collect())
    }
}
