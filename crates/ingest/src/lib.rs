//! Detection-event ingestion.
//!
//! Pulls person-detection events from an external real-time feed and
//! reconciles each one into the relational store: deduplicated, classified
//! as new or repeat, and folded into the person ledger in one transaction.
//!
//! - [`source`]: the [`EventSource`] seam and the polling subscription
//! - [`firebase`]: Realtime Database REST adapter
//! - [`reconciler`]: per-event unit of work
//! - [`backfill`] / [`live`]: one-shot and long-running sync drivers

pub mod backfill;
pub mod config;
pub mod error;
pub mod firebase;
pub mod live;
pub mod memory;
pub mod reconciler;
pub mod retry;
pub mod source;

pub use backfill::{run_backfill, BackfillReport};
pub use config::SyncConfig;
pub use error::{SourceError, SyncError};
pub use live::{run_live_sync, start_live_sync, LiveSyncSummary};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use source::{EventSource, FeedRecord, Subscription};
