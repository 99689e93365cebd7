//! Organizations, cameras and persons over HTTP.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use sqlx::PgPool;

use common::{body_json, delete, get, post_json, put_json, spawn_app, submit_event, TestApp};

/// Create an organization as admin and return `(id, plaintext key)`.
async fn create_org(app: &TestApp, name: &str) -> (i64, String) {
    let response = post_json(
        &app.router,
        "/api/v1/organizations",
        &app.admin_key,
        json!({"name": name, "description": "test tenant"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let id = json["data"]["organization"]["id"].as_i64().unwrap();
    let key = json["data"]["api_key"]["plaintext_key"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(json["data"]["api_key"]["organization_id"], id);
    (id, key)
}

async fn create_camera(app: &TestApp, key: &str, body: Value) -> Value {
    let response = post_json(&app.router, "/api/v1/cameras", key, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_organization_key_is_scoped_to_its_tenant(pool: PgPool) {
    let app = spawn_app(pool).await;
    let (org_id, org_key) = create_org(&app, "Acme").await;

    let response = get(&app.router, &format!("/api/v1/organizations/{org_id}"), &org_key).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["name"], "Acme");

    let default_uri = format!("/api/v1/organizations/{}", app.default_organization_id);
    let response = get(&app.router, &default_uri, &org_key).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(&app.router, "/api/v1/organizations", &org_key).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin sees both the default organization and the new one.
    let json = body_json(get(&app.router, "/api/v1/organizations", &app.admin_key).await).await;
    assert_eq!(json["pagination"]["total"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_organization_update_and_validation(pool: PgPool) {
    let app = spawn_app(pool).await;
    let (org_id, org_key) = create_org(&app, "Acme").await;
    let uri = format!("/api/v1/organizations/{org_id}");

    let response = put_json(&app.router, &uri, &org_key, json!({"name": "Acme Retail"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["name"], "Acme Retail");

    let response = put_json(&app.router, &uri, &org_key, json!({"name": "  "})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        &app.router,
        "/api/v1/organizations",
        &app.admin_key,
        json!({"name": ""}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_organization_delete_rules(pool: PgPool) {
    let app = spawn_app(pool).await;

    let default_uri = format!("/api/v1/organizations/{}", app.default_organization_id);
    let response = delete(&app.router, &default_uri, &app.admin_key).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let (busy_id, busy_key) = create_org(&app, "Busy").await;
    create_camera(&app, &busy_key, json!({"id": "busy-cam", "name": "Door"})).await;
    let response = delete(&app.router, &format!("/api/v1/organizations/{busy_id}"), &busy_key).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let (idle_id, idle_key) = create_org(&app, "Idle").await;
    let response = delete(&app.router, &format!("/api/v1/organizations/{idle_id}"), &app.admin_key).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Keys of a deleted organization stop working.
    let response = get(&app.router, "/api/v1/cameras", &idle_key).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Cameras
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_camera_crud(pool: PgPool) {
    let app = spawn_app(pool).await;

    let created = create_camera(
        &app,
        &app.admin_key,
        json!({"id": "cam-lobby", "name": "Lobby", "location": "Ground floor"}),
    )
    .await;
    assert_eq!(created["data"]["id"], "cam-lobby");
    assert_eq!(created["data"]["status"], "active");

    let generated = create_camera(&app, &app.admin_key, json!({"name": "Parking"})).await;
    assert!(uuid::Uuid::parse_str(generated["data"]["id"].as_str().unwrap()).is_ok());

    let json = body_json(get(&app.router, "/api/v1/cameras", &app.admin_key).await).await;
    assert_eq!(json["pagination"]["total"], 2);

    let response = put_json(
        &app.router,
        "/api/v1/cameras/cam-lobby",
        &app.admin_key,
        json!({"status": "inactive"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["status"], "inactive");
    assert_eq!(updated["data"]["name"], "Lobby");

    let response = delete(&app.router, "/api/v1/cameras/cam-lobby", &app.admin_key).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(&app.router, "/api/v1/cameras/cam-lobby", &app.admin_key).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_camera_id_reuse_conflicts(pool: PgPool) {
    let app = spawn_app(pool).await;
    create_camera(&app, &app.admin_key, json!({"id": "cam-1", "name": "One"})).await;

    let response = post_json(
        &app.router,
        "/api/v1/cameras",
        &app.admin_key,
        json!({"id": "cam-1", "name": "Again"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_camera_with_logs_cannot_be_deleted(pool: PgPool) {
    let app = spawn_app(pool).await;
    create_camera(&app, &app.admin_key, json!({"id": "cam-1", "name": "One"})).await;
    assert_eq!(submit_event(&app, 1_000, "h1", "cam-1").await, 201);

    let response = delete(&app.router, "/api/v1/cameras/cam-1", &app.admin_key).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_events_follow_camera_organization(pool: PgPool) {
    let app = spawn_app(pool).await;
    let (org_id, org_key) = create_org(&app, "Acme").await;
    create_camera(&app, &org_key, json!({"id": "acme-cam", "name": "Entrance"})).await;

    // 2024-01-15T10:00:00Z
    assert_eq!(submit_event(&app, 1_705_312_800, "h1", "acme-cam").await, 201);

    let acme = body_json(get(&app.router, "/api/v1/summary?date=2024-01-15", &org_key).await).await;
    assert_eq!(acme["data"]["total"], 1);
    assert_eq!(acme["data"]["organization_id"], org_id);

    let default = body_json(get(&app.router, "/api/v1/summary?date=2024-01-15", &app.admin_key).await).await;
    assert_eq!(default["data"]["total"], 0);

    // Other tenants cannot see the camera either.
    let response = get(&app.router, "/api/v1/cameras/acme-cam", &app.admin_key).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Persons
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_person_ledger_and_stats(pool: PgPool) {
    let app = spawn_app(pool).await;
    submit_event(&app, 1_000, "h1", "cam-1").await;
    submit_event(&app, 2_000, "h1", "cam-1").await;
    submit_event(&app, 90_000, "h1", "cam-2").await;

    let json = body_json(get(&app.router, "/api/v1/persons", &app.admin_key).await).await;
    assert_eq!(json["pagination"]["total"], 1);

    let person = body_json(get(&app.router, "/api/v1/persons/h1", &app.admin_key).await).await;
    assert_eq!(person["data"]["visit_count"], 3);

    let stats = body_json(get(&app.router, "/api/v1/persons/h1/stats", &app.admin_key).await).await;
    assert_eq!(stats["data"]["total_visits"], 3);
    assert_eq!(stats["data"]["new"], 1);
    assert_eq!(stats["data"]["repeat"], 2);
    assert_eq!(stats["data"]["face_image_count"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_person_delete_hides_logs(pool: PgPool) {
    let app = spawn_app(pool).await;
    submit_event(&app, 1_000, "h1", "cam-1").await;

    let response = delete(&app.router, "/api/v1/persons/h1", &app.admin_key).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(&app.router, "/api/v1/persons/h1", &app.admin_key).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let logs = body_json(get(&app.router, "/api/v1/logs?person_hash=h1", &app.admin_key).await).await;
    assert_eq!(logs["pagination"]["total"], 0);

    let response = delete(&app.router, "/api/v1/persons/h1", &app.admin_key).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
