//! Read-side reports over the detection logs with a cache-aside layer.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;

pub use aggregator::ReportingService;
pub use cache::{Cache, CacheError, MemoryCache, RedisCache};
pub use config::CacheConfig;
pub use error::ReportError;
