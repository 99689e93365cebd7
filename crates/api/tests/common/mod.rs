//! Shared harness for the HTTP integration tests.
//!
//! Builds the real router on top of a migrated test database, an in-memory
//! report cache, an in-memory feed and an in-memory blob store.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use manta_api::config::ServerConfig;
use manta_api::router::build_app_router;
use manta_api::state::AppState;
use manta_api::storage::{BlobStore, StorageError};
use manta_core::rate_limit::RateLimiter;
use manta_ingest::memory::MemoryEventSource;
use manta_ingest::{EventSource, Reconciler, SyncConfig};
use manta_reporting::{MemoryCache, ReportingService};

pub const MULTIPART_BOUNDARY: &str = "manta-test-boundary";

/// Blob store that keeps objects in a map.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(format!("http://blobs.test/{key}"))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Knobs for [`spawn_app_with`].
pub struct TestOptions {
    pub with_source: bool,
    pub rate_limit_max: u32,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            with_source: true,
            rate_limit_max: 10_000,
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    /// Plaintext admin key issued by bootstrap.
    pub admin_key: String,
    pub default_organization_id: i64,
    pub source: Arc<MemoryEventSource>,
    pub blobs: Arc<MemoryBlobStore>,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(rate_limit_max: u32) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 1,
        rate_limit_max,
        rate_limit_window_secs: 60,
        rate_limit_max_clients: 1_000,
        db_max_connections: 5,
    }
}

pub async fn spawn_app(pool: PgPool) -> TestApp {
    spawn_app_with(pool, TestOptions::default()).await
}

pub async fn spawn_app_with(pool: PgPool, options: TestOptions) -> TestApp {
    let boot = manta_db::bootstrap(&pool).await.unwrap();
    let admin_key = boot
        .issued_admin_key
        .expect("fresh database should issue an admin key");

    let config = test_config(options.rate_limit_max);
    let source = Arc::new(MemoryEventSource::new());
    let blobs = Arc::new(MemoryBlobStore::default());

    let event_source: Option<Arc<dyn EventSource>> = if options.with_source {
        Some(source.clone())
    } else {
        None
    };

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        reporting: ReportingService::new(
            pool.clone(),
            Arc::new(MemoryCache::new()),
            Duration::from_secs(3600),
        ),
        reconciler: Arc::new(Reconciler::new(
            pool.clone(),
            boot.default_organization_id,
            Duration::from_secs(10),
        )),
        event_source,
        sync_config: Arc::new(SyncConfig::default()),
        blob_store: blobs.clone(),
        rate_limiter: Arc::new(RateLimiter::new(
            config.rate_limit_max,
            Duration::from_secs(config.rate_limit_window_secs),
            config.rate_limit_max_clients,
        )),
    };

    TestApp {
        router: build_app_router(state, &config, None),
        pool,
        admin_key,
        default_organization_id: boot.default_organization_id,
        source,
        blobs,
    }
}

/// Send a request through the router. `key` goes in the `x-api-key` header.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    key: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str, key: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(key), None).await
}

pub async fn post_json(app: &Router, uri: &str, key: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(key), Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, key: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(key), Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, key: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(key), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Submit one detection event over HTTP and return the response status.
pub async fn submit_event(app: &TestApp, ts: i64, hash: &str, camera: &str) -> u16 {
    let body = serde_json::json!({
        "id": format!("{hash}-{ts}"),
        "timestamp": ts,
        "person_hash": hash,
        "camera_id": camera,
    });
    post_json(&app.router, "/api/v1/sync/events", &app.admin_key, body)
        .await
        .status()
        .as_u16()
}

/// A multipart body with text fields and one optional file part.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: &Router, uri: &str, key: &str, body: Vec<u8>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-api-key", key)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}
