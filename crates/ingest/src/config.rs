use std::time::Duration;

use crate::retry::RetryPolicy;

/// Event sync configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Realtime Database base URL. Sync is disabled when unset.
    pub firebase_database_url: Option<String>,
    /// Database secret or ID token passed as the `auth` query parameter.
    pub firebase_auth_token: Option<String>,
    /// Feed path holding the detection records (default: `logs`).
    pub logs_path: String,
    /// Delay between live polls (default: 5 s).
    pub poll_interval: Duration,
    /// Upper bound on one feed fetch (default: 15 s).
    pub fetch_timeout: Duration,
    /// Upper bound on one reconcile transaction (default: 10 s).
    pub store_timeout: Duration,
    /// Number of records pulled by the startup backfill (default: 1000).
    pub backfill_limit: usize,
    pub retry: RetryPolicy,
}

impl SyncConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `FIREBASE_DATABASE_URL`   | unset   |
    /// | `FIREBASE_AUTH_TOKEN`     | unset   |
    /// | `SYNC_LOGS_PATH`          | `logs`  |
    /// | `SYNC_POLL_INTERVAL_SECS` | `5`     |
    /// | `SYNC_FETCH_TIMEOUT_SECS` | `15`    |
    /// | `SYNC_STORE_TIMEOUT_SECS` | `10`    |
    /// | `SYNC_BACKFILL_LIMIT`     | `1000`  |
    /// | `SYNC_MAX_ATTEMPTS`       | `3`     |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let firebase_database_url = non_empty_var("FIREBASE_DATABASE_URL");
        let firebase_auth_token = non_empty_var("FIREBASE_AUTH_TOKEN");
        let logs_path = non_empty_var("SYNC_LOGS_PATH").unwrap_or(defaults.logs_path);

        let poll_interval_secs: u64 = std::env::var("SYNC_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("SYNC_POLL_INTERVAL_SECS must be a valid u64");

        let fetch_timeout_secs: u64 = std::env::var("SYNC_FETCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("SYNC_FETCH_TIMEOUT_SECS must be a valid u64");

        let store_timeout_secs: u64 = std::env::var("SYNC_STORE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("SYNC_STORE_TIMEOUT_SECS must be a valid u64");

        let backfill_limit: usize = std::env::var("SYNC_BACKFILL_LIMIT")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("SYNC_BACKFILL_LIMIT must be a valid usize");

        let max_attempts: u32 = std::env::var("SYNC_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("SYNC_MAX_ATTEMPTS must be a valid u32");

        Self {
            firebase_database_url,
            firebase_auth_token,
            logs_path,
            poll_interval: Duration::from_secs(poll_interval_secs.max(1)),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs.max(1)),
            store_timeout: Duration::from_secs(store_timeout_secs.max(1)),
            backfill_limit,
            retry: RetryPolicy {
                max_attempts: max_attempts.max(1),
                ..RetryPolicy::default()
            },
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            firebase_database_url: None,
            firebase_auth_token: None,
            logs_path: "logs".to_string(),
            poll_interval: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(15),
            store_timeout: Duration::from_secs(10),
            backfill_limit: 1000,
            retry: RetryPolicy::default(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
