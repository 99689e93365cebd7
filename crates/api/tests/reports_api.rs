//! Event submission, daily reports and log search over HTTP.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::{body_json, get, post_json, spawn_app, submit_event};

/// 2024-01-15T00:00:00Z
const DAY_START: i64 = 1_705_276_800;
const HOUR: i64 = 3_600;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submitted_events_feed_reports(pool: PgPool) {
    let app = spawn_app(pool).await;

    assert_eq!(submit_event(&app, DAY_START + 8 * HOUR, "h1", "cam-1").await, 201);
    assert_eq!(submit_event(&app, DAY_START + 9 * HOUR + 1_800, "h1", "cam-1").await, 201);
    assert_eq!(submit_event(&app, DAY_START + 9 * HOUR + 2_700, "h2", "cam-2").await, 201);

    let response = get(&app.router, "/api/v1/summary?date=2024-01-15", &app.admin_key).await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["data"]["date"], "2024-01-15");
    assert_eq!(summary["data"]["total"], 3);
    assert_eq!(summary["data"]["new"], 2);
    assert_eq!(summary["data"]["repeat"], 1);
    assert_eq!(summary["data"]["organization_id"], app.default_organization_id);

    let heatmap = body_json(get(&app.router, "/api/v1/heatmap?date=2024-01-15", &app.admin_key).await).await;
    assert_eq!(
        heatmap["data"]["buckets"],
        json!([{"hour": "08:00", "count": 1}, {"hour": "09:00", "count": 2}])
    );

    let stats = body_json(get(&app.router, "/api/v1/person-stats?date=2024-01-15", &app.admin_key).await).await;
    assert_eq!(stats["data"]["new"], 2);
    assert_eq!(stats["data"]["repeat"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_event_is_ok_not_created(pool: PgPool) {
    let app = spawn_app(pool).await;

    assert_eq!(submit_event(&app, DAY_START, "h1", "cam-1").await, 201);
    assert_eq!(submit_event(&app, DAY_START, "h1", "cam-1").await, 200);

    let summary = body_json(get(&app.router, "/api/v1/summary?date=2024-01-15", &app.admin_key).await).await;
    assert_eq!(summary["data"]["total"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submission_invalidates_cached_summary(pool: PgPool) {
    let app = spawn_app(pool).await;
    let uri = "/api/v1/summary?date=2024-01-15";

    let before = body_json(get(&app.router, uri, &app.admin_key).await).await;
    assert_eq!(before["data"]["total"], 0);

    assert_eq!(submit_event(&app, DAY_START + HOUR, "h1", "cam-1").await, 201);

    let after = body_json(get(&app.router, uri, &app.admin_key).await).await;
    assert_eq!(after["data"]["total"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_event_is_rejected(pool: PgPool) {
    let app = spawn_app(pool).await;

    let response = post_json(
        &app.router,
        "/api/v1/sync/events",
        &app.admin_key,
        json!({"timestamp": 100, "person_hash": "  ", "camera_id": "cam-1"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_malformed_report_date_is_bad_request(pool: PgPool) {
    let app = spawn_app(pool).await;

    let response = get(&app.router, "/api/v1/summary?date=15-01-2024", &app.admin_key).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_log_search_filters_and_paginates(pool: PgPool) {
    let app = spawn_app(pool).await;

    for i in 0..3 {
        submit_event(&app, DAY_START + i * HOUR, "h1", "cam-1").await;
    }
    submit_event(&app, DAY_START + 4 * HOUR, "h2", "cam-2").await;

    let response = get(&app.router, "/api/v1/logs?person_hash=h1&page_size=2", &app.admin_key).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["pagination"]["total"], 3);
    assert_eq!(json["pagination"]["total_page"], 2);
    assert!(json["data"].as_array().unwrap().iter().all(|l| l["person_hash"] == "h1"));

    let json = body_json(get(&app.router, "/api/v1/logs?camera_id=cam-2", &app.admin_key).await).await;
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["data"][0]["is_new_person"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_log_search_rejects_inverted_range(pool: PgPool) {
    let app = spawn_app(pool).await;

    let response = get(
        &app.router,
        "/api/v1/logs?from=2024-01-16T00:00:00Z&to=2024-01-15T00:00:00Z",
        &app.admin_key,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_out_of_range_report_date_is_bad_request(pool: PgPool) {
    let app = spawn_app(pool).await;

    for uri in [
        "/api/v1/summary?date=%2B262142-12-31",
        "/api/v1/heatmap?date=%2B262142-12-31",
        "/api/v1/person-stats?date=%2B262142-12-31",
    ] {
        let response = get(&app.router, uri, &app.admin_key).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}
