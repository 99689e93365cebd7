//! On-demand backfill, admin gating and rate limiting over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

use common::{body_json, get, post_json, send, spawn_app, spawn_app_with, TestOptions};
use manta_core::event::RawEvent;

fn event(ts: i64, hash: &str) -> RawEvent {
    RawEvent {
        id: Some(format!("{hash}-{ts}")),
        timestamp: ts,
        person_hash: hash.to_string(),
        camera_id: "cam-1".to_string(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_backfill_pulls_from_feed(pool: PgPool) {
    let app = spawn_app(pool).await;
    app.source.push(event(100, "h1"));
    app.source.push(event(200, "h1"));
    app.source.push(event(300, "h2"));

    let response = post_json(&app.router, "/api/v1/sync/backfill", &app.admin_key, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["data"]["fetched"], 3);
    assert_eq!(report["data"]["recorded"], 3);

    // A second run only sees duplicates.
    let report = body_json(
        post_json(&app.router, "/api/v1/sync/backfill", &app.admin_key, json!({"limit": 2})).await,
    )
    .await;
    assert_eq!(report["data"]["fetched"], 2);
    assert_eq!(report["data"]["recorded"], 0);
    assert_eq!(report["data"]["duplicates"], 2);

    let persons = body_json(get(&app.router, "/api/v1/persons", &app.admin_key).await).await;
    assert_eq!(persons["pagination"]["total"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_backfill_without_body_uses_default_limit(pool: PgPool) {
    let app = spawn_app(pool).await;
    app.source.push(event(100, "h1"));

    let response = send(
        &app.router,
        Method::POST,
        "/api/v1/sync/backfill",
        Some(app.admin_key.as_str()),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["recorded"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_backfill_surfaces_feed_failure(pool: PgPool) {
    let app = spawn_app(pool).await;
    app.source.fail_next(401);

    let response = post_json(&app.router, "/api/v1/sync/backfill", &app.admin_key, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "UPSTREAM_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_backfill_without_source_is_bad_request(pool: PgPool) {
    let app = spawn_app_with(
        pool,
        TestOptions {
            with_source: false,
            ..TestOptions::default()
        },
    )
    .await;

    let response = post_json(&app.router, "/api/v1/sync/backfill", &app.admin_key, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let health = body_json(send(&app.router, Method::GET, "/health", None, None).await).await;
    assert_eq!(health["sync_enabled"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sync_routes_require_admin(pool: PgPool) {
    let app = spawn_app(pool).await;

    let created = body_json(
        post_json(&app.router, "/api/v1/organizations", &app.admin_key, json!({"name": "Acme"})).await,
    )
    .await;
    let org_key = created["data"]["api_key"]["plaintext_key"].as_str().unwrap();

    let response = post_json(
        &app.router,
        "/api/v1/sync/events",
        org_key,
        json!({"timestamp": 100, "person_hash": "h1", "camera_id": "cam-1"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(&app.router, "/api/v1/sync/backfill", org_key, json!({})).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rate_limit_headers_and_rejection(pool: PgPool) {
    let app = spawn_app_with(
        pool,
        TestOptions {
            rate_limit_max: 2,
            ..TestOptions::default()
        },
    )
    .await;

    let first = get(&app.router, "/api/v1/cameras", &app.admin_key).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-ratelimit-limit"], "2");
    assert_eq!(first.headers()["x-ratelimit-remaining"], "1");

    let second = get(&app.router, "/api/v1/cameras", &app.admin_key).await;
    assert_eq!(second.headers()["x-ratelimit-remaining"], "0");

    let third = get(&app.router, "/api/v1/cameras", &app.admin_key).await;
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(third.headers().contains_key("retry-after"));
    assert_eq!(body_json(third).await["code"], "RATE_LIMITED");

    // Health is outside the limited tree.
    let health = send(&app.router, Method::GET, "/health", None, None).await;
    assert_eq!(health.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rate_limit_is_per_forwarded_client(pool: PgPool) {
    let app = spawn_app_with(
        pool,
        TestOptions {
            rate_limit_max: 1,
            ..TestOptions::default()
        },
    )
    .await;

    let request = |ip: &'static str| {
        axum::http::Request::builder()
            .uri("/api/v1")
            .header("x-forwarded-for", ip)
            .body(axum::body::Body::empty())
            .unwrap()
    };

    let a = app.router.clone().oneshot(request("10.0.0.1")).await.unwrap();
    let b = app.router.clone().oneshot(request("10.0.0.2")).await.unwrap();
    let a_again = app.router.clone().oneshot(request("10.0.0.1")).await.unwrap();

    assert_eq!(a.status(), StatusCode::OK);
    assert_eq!(b.status(), StatusCode::OK);
    assert_eq!(a_again.status(), StatusCode::TOO_MANY_REQUESTS);
}
