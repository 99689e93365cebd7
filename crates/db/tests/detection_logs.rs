//! Integration tests for the deduplicating insert and log search.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use manta_core::pagination::PageRequest;
use manta_db::models::detection_log::{LogFilter, NewDetectionLog};
use manta_db::repositories::{DetectionLogRepo, OrganizationRepo};

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn log<'a>(org: i64, hash: &'a str, camera: &'a str, secs: i64) -> NewDetectionLog<'a> {
    NewDetectionLog {
        external_id: None,
        detected_at: ts(secs),
        person_hash: hash,
        camera_id: camera,
        organization_id: org,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_dedup_rejects_same_key(pool: PgPool) {
    let org = OrganizationRepo::default_id(&pool).await.unwrap().unwrap();
    let mut conn = pool.acquire().await.unwrap();

    let first = DetectionLogRepo::insert_dedup(&mut conn, &log(org, "h1", "c1", 100))
        .await
        .unwrap();
    assert!(first.is_some());

    let again = DetectionLogRepo::insert_dedup(&mut conn, &log(org, "h1", "c1", 100))
        .await
        .unwrap();
    assert!(again.is_none());

    // Same person and time on another camera is a distinct event.
    let other_camera = DetectionLogRepo::insert_dedup(&mut conn, &log(org, "h1", "c2", 100))
        .await
        .unwrap();
    assert!(other_camera.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_is_new_person_uses_event_time(pool: PgPool) {
    let org = OrganizationRepo::default_id(&pool).await.unwrap().unwrap();
    let mut conn = pool.acquire().await.unwrap();

    let later = DetectionLogRepo::insert_dedup(&mut conn, &log(org, "h1", "c1", 200))
        .await
        .unwrap()
        .unwrap();
    assert!(later.is_new_person);

    // Arrives second but happened first: still counts as new.
    let earlier = DetectionLogRepo::insert_dedup(&mut conn, &log(org, "h1", "c1", 100))
        .await
        .unwrap()
        .unwrap();
    assert!(earlier.is_new_person);

    let repeat = DetectionLogRepo::insert_dedup(&mut conn, &log(org, "h1", "c1", 300))
        .await
        .unwrap()
        .unwrap();
    assert!(!repeat.is_new_person);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_soft_deleted_log_still_blocks_reingestion(pool: PgPool) {
    let org = OrganizationRepo::default_id(&pool).await.unwrap().unwrap();
    let mut conn = pool.acquire().await.unwrap();
    DetectionLogRepo::insert_dedup(&mut conn, &log(org, "h1", "c1", 100)).await.unwrap();
    sqlx::query("UPDATE detection_logs SET deleted_at = NOW()")
        .execute(&mut *conn)
        .await
        .unwrap();

    let again = DetectionLogRepo::insert_dedup(&mut conn, &log(org, "h1", "c1", 100))
        .await
        .unwrap();
    assert!(again.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_filters_and_pagination(pool: PgPool) {
    let org = OrganizationRepo::default_id(&pool).await.unwrap().unwrap();
    let mut conn = pool.acquire().await.unwrap();
    for (hash, camera, secs) in [("a", "c1", 10), ("b", "c1", 20), ("a", "c2", 30), ("c", "c1", 40)] {
        DetectionLogRepo::insert_dedup(&mut conn, &log(org, hash, camera, secs))
            .await
            .unwrap();
    }
    drop(conn);

    let all = LogFilter::default();
    assert_eq!(DetectionLogRepo::count(&pool, org, &all).await.unwrap(), 4);

    let page = PageRequest::new(Some(1), Some(2));
    let newest = DetectionLogRepo::search(&pool, org, &all, &page).await.unwrap();
    let times: Vec<_> = newest.iter().map(|l| l.detected_at.timestamp()).collect();
    assert_eq!(times, vec![40, 30]);

    let by_camera = LogFilter {
        camera_id: Some("c1".into()),
        from: Some(ts(15)),
        ..Default::default()
    };
    assert_eq!(DetectionLogRepo::count(&pool, org, &by_camera).await.unwrap(), 2);

    let by_person = LogFilter {
        person_hash: Some("a".into()),
        to: Some(ts(30)),
        ..Default::default()
    };
    let rows = DetectionLogRepo::search(&pool, org, &by_person, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].camera_id, "c1");

    assert_eq!(
        DetectionLogRepo::latest_detected_at(&pool).await.unwrap(),
        Some(ts(40))
    );
}
