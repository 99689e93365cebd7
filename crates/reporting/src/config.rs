use std::time::Duration;

/// Report cache configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis connection URL. The in-process cache is used when unset.
    pub redis_url: Option<String>,
    /// Lifetime of a cached report (default: 1 hour).
    pub ttl: Duration,
    /// Upper bound on one cache round trip (default: 500 ms).
    pub timeout: Duration,
}

impl CacheConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default |
    /// |--------------------|---------|
    /// | `REDIS_URL`        | unset   |
    /// | `CACHE_TTL_SECS`   | `3600`  |
    /// | `CACHE_TIMEOUT_MS` | `500`   |
    pub fn from_env() -> Self {
        let redis_url = std::env::var("REDIS_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let ttl_secs: u64 = std::env::var("CACHE_TTL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("CACHE_TTL_SECS must be a valid u64");

        let timeout_ms: u64 = std::env::var("CACHE_TIMEOUT_MS")
            .unwrap_or_else(|_| "500".into())
            .parse()
            .expect("CACHE_TIMEOUT_MS must be a valid u64");

        Self {
            redis_url,
            ttl: Duration::from_secs(ttl_secs.max(1)),
            timeout: Duration::from_millis(timeout_ms.max(1)),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl: Duration::from_secs(3600),
            timeout: Duration::from_millis(500),
        }
    }
}
