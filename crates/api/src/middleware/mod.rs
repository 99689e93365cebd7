//! Request authentication and throttling.
//!
//! - [`auth::ApiKeyAuth`] -- Resolves the caller's API key to an organization.
//! - [`auth::RequireAdmin`] -- Requires a key of the default organization.
//! - [`rate_limit::rate_limit`] -- Per-client request quota.

pub mod auth;
pub mod rate_limit;
