use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on joining background tasks after the listener stops (default: `10`).
    pub shutdown_timeout_secs: u64,
    /// Burst of requests allowed per client per window (default: `100`).
    pub rate_limit_max: u32,
    /// Rate-limit window length in seconds (default: `60`).
    pub rate_limit_window_secs: u64,
    /// Upper bound on clients tracked by the rate limiter (default: `10000`).
    pub rate_limit_max_clients: usize,
    /// Database pool size (default: `20`).
    pub db_max_connections: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                                       |
    /// |--------------------------|-----------------------------------------------|
    /// | `HOST`                   | `0.0.0.0`                                     |
    /// | `PORT`                   | `8080`                                        |
    /// | `CORS_ORIGINS`           | `http://localhost:3000,http://localhost:8080` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                                          |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `10`                                          |
    /// | `RATE_LIMIT_MAX`         | `100`                                         |
    /// | `RATE_LIMIT_WINDOW_SECS` | `60`                                          |
    /// | `RATE_LIMIT_MAX_CLIENTS` | `10000`                                       |
    /// | `DB_MAX_CONNECTIONS`     | `20`                                          |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:8080".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let rate_limit_max: u32 = std::env::var("RATE_LIMIT_MAX")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("RATE_LIMIT_MAX must be a valid u32");

        let rate_limit_window_secs: u64 = std::env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("RATE_LIMIT_WINDOW_SECS must be a valid u64");

        let rate_limit_max_clients: usize = std::env::var("RATE_LIMIT_MAX_CLIENTS")
            .unwrap_or_else(|_| "10000".into())
            .parse()
            .expect("RATE_LIMIT_MAX_CLIENTS must be a valid usize");

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid u32");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            rate_limit_max,
            rate_limit_window_secs,
            rate_limit_max_clients,
            db_max_connections,
        }
    }
}

/// Where uploaded face images are kept.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Files under `path`, served by this process at `/media`.
    Local { path: PathBuf, public_url: String },
    S3(S3Config),
}

/// Connection settings for an S3-compatible object store.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Custom endpoint, e.g. a MinIO URL. AWS is used when unset.
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub use_path_style: bool,
}

impl StorageConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                       |
    /// |----------------------|-------------------------------|
    /// | `STORAGE_BACKEND`    | `local` (or `s3`)             |
    /// | `STORAGE_LOCAL_PATH` | `./storage/faces`             |
    /// | `STORAGE_PUBLIC_URL` | `http://localhost:8080/media` |
    /// | `S3_ENDPOINT`        | unset                         |
    /// | `S3_REGION`          | `us-east-1`                   |
    /// | `S3_BUCKET`          | `faces`                       |
    /// | `S3_ACCESS_KEY`      | required for `s3`             |
    /// | `S3_SECRET_KEY`      | required for `s3`             |
    /// | `S3_USE_PATH_STYLE`  | `false`                       |
    pub fn from_env() -> Self {
        let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".into());

        match backend.trim().to_ascii_lowercase().as_str() {
            "s3" => {
                let endpoint = std::env::var("S3_ENDPOINT")
                    .ok()
                    .map(|v| v.trim().trim_end_matches('/').to_string())
                    .filter(|v| !v.is_empty());

                let use_path_style: bool = std::env::var("S3_USE_PATH_STYLE")
                    .unwrap_or_else(|_| "false".into())
                    .parse()
                    .expect("S3_USE_PATH_STYLE must be true or false");

                Self::S3(S3Config {
                    endpoint,
                    region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
                    bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "faces".into()),
                    access_key: std::env::var("S3_ACCESS_KEY")
                        .expect("S3_ACCESS_KEY must be set when STORAGE_BACKEND=s3"),
                    secret_key: std::env::var("S3_SECRET_KEY")
                        .expect("S3_SECRET_KEY must be set when STORAGE_BACKEND=s3"),
                    use_path_style,
                })
            }
            "local" => Self::Local {
                path: std::env::var("STORAGE_LOCAL_PATH")
                    .unwrap_or_else(|_| "./storage/faces".into())
                    .into(),
                public_url: std::env::var("STORAGE_PUBLIC_URL")
                    .unwrap_or_else(|_| "http://localhost:8080/media".into())
                    .trim_end_matches('/')
                    .to_string(),
            },
            other => panic!("STORAGE_BACKEND must be 'local' or 's3', got '{other}'"),
        }
    }
}
