use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use manta_core::rate_limit::RateLimiter;
use manta_ingest::firebase::FirebaseEventSource;
use manta_ingest::{EventSource, Reconciler, SyncConfig};
use manta_reporting::{Cache, CacheConfig, MemoryCache, RedisCache, ReportingService};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use manta_api::background::{feed_sync, rate_limit_purge};
use manta_api::config::{ServerConfig, StorageConfig};
use manta_api::router::build_app_router;
use manta_api::state::AppState;
use manta_api::storage::build_blob_store;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "manta_api=debug,manta_ingest=debug,manta_reporting=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let cache_config = CacheConfig::from_env();
    let storage_config = StorageConfig::from_env();
    let sync_config = SyncConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = manta_db::create_pool(&database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    manta_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    manta_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let bootstrap = manta_db::bootstrap(&pool)
        .await
        .expect("Failed to bootstrap the default organization");
    if let Some(key) = &bootstrap.issued_admin_key {
        // Shown once; only the hash is stored.
        tracing::warn!(api_key = %key, "Initial admin API key issued, store it now");
    }

    // --- Report cache ---
    let cache: Arc<dyn Cache> = match &cache_config.redis_url {
        Some(url) => match RedisCache::connect(url, cache_config.timeout).await {
            Ok(redis) => {
                tracing::info!("Connected to Redis report cache");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, using in-process report cache");
                Arc::new(MemoryCache::new())
            }
        },
        None => {
            tracing::info!("REDIS_URL not set, using in-process report cache");
            Arc::new(MemoryCache::new())
        }
    };
    let reporting = ReportingService::new(pool.clone(), cache, cache_config.ttl);

    // --- Blob storage ---
    let blob_store = build_blob_store(&storage_config)
        .await
        .expect("Failed to initialise face image storage");
    let media_dir = match &storage_config {
        StorageConfig::Local { path, .. } => Some(path.clone()),
        StorageConfig::S3(_) => None,
    };
    tracing::info!(local = media_dir.is_some(), "Face image storage ready");

    // --- Event sync ---
    let reconciler = Arc::new(Reconciler::new(
        pool.clone(),
        bootstrap.default_organization_id,
        sync_config.store_timeout,
    ));

    let event_source: Option<Arc<dyn EventSource>> = match &sync_config.firebase_database_url {
        Some(url) => match FirebaseEventSource::new(
            url,
            sync_config.firebase_auth_token.clone(),
            sync_config.fetch_timeout,
        ) {
            Ok(source) => Some(Arc::new(source)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build event source, sync disabled");
                None
            }
        },
        None => {
            tracing::info!("FIREBASE_DATABASE_URL not set, sync disabled");
            None
        }
    };

    let sync_cancel = CancellationToken::new();
    let sync_handle = event_source.clone().map(|source| {
        tokio::spawn(feed_sync::run(
            pool.clone(),
            Arc::clone(&reconciler),
            source,
            sync_config.clone(),
            sync_cancel.clone(),
        ))
    });

    // --- Rate limiting ---
    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
        config.rate_limit_max_clients,
    ));
    let purge_cancel = CancellationToken::new();
    let purge_handle = tokio::spawn(rate_limit_purge::run(
        Arc::clone(&rate_limiter),
        rate_limit_purge::PURGE_INTERVAL,
        purge_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        reporting,
        reconciler,
        event_source,
        sync_config: Arc::new(sync_config),
        blob_store,
        rate_limiter,
    };

    let app = build_app_router(state, &config, media_dir.as_deref());

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);

    sync_cancel.cancel();
    if let Some(handle) = sync_handle {
        if tokio::time::timeout(shutdown_timeout, handle).await.is_err() {
            tracing::warn!("Event sync did not stop within the shutdown timeout");
        }
    }
    tracing::info!("Event sync stopped");

    purge_cancel.cancel();
    let _ = tokio::time::timeout(shutdown_timeout, purge_handle).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
