pub mod api_keys;
pub mod error;
pub mod event;
pub mod pagination;
pub mod rate_limit;
pub mod reporting;
pub mod types;
