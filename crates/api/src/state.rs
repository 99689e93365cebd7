use std::sync::Arc;

use manta_core::rate_limit::RateLimiter;
use manta_ingest::{EventSource, Reconciler, SyncConfig};
use manta_reporting::ReportingService;

use crate::config::ServerConfig;
use crate::storage::BlobStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: manta_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Cached daily reports.
    pub reporting: ReportingService,
    pub reconciler: Arc<Reconciler>,
    /// Feed used for on-demand backfill. `None` when sync is not configured.
    pub event_source: Option<Arc<dyn EventSource>>,
    pub sync_config: Arc<SyncConfig>,
    /// Face image storage.
    pub blob_store: Arc<dyn BlobStore>,
    /// Per-client request counters shared by the rate-limit middleware.
    pub rate_limiter: Arc<RateLimiter>,
}
