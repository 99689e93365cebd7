use sqlx::PgPool;

/// Full bootstrap: connect, migrate, seed default organization and admin key.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    manta_db::health_check(&pool).await.unwrap();

    let first = manta_db::bootstrap(&pool).await.unwrap();
    let key = first.issued_admin_key.expect("first run issues an admin key");
    assert_eq!(key.len(), manta_core::api_keys::KEY_LENGTH);

    let hash = manta_core::api_keys::hash_api_key(&key);
    let active = manta_db::repositories::ApiKeyRepo::find_active_by_hash(&pool, &hash)
        .await
        .unwrap()
        .expect("issued key should authenticate");
    assert_eq!(active.organization_id, first.default_organization_id);
    assert!(active.is_default_organization);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bootstrap_is_idempotent(pool: PgPool) {
    let first = manta_db::bootstrap(&pool).await.unwrap();
    let second = manta_db::bootstrap(&pool).await.unwrap();

    assert_eq!(first.default_organization_id, second.default_organization_id);
    assert!(second.issued_admin_key.is_none());

    let keys: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_keys")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(keys, 1);
}

/// Exactly one default organization is seeded by the migrations.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_default_organization_seeded(pool: PgPool) {
    let defaults: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM organizations WHERE is_default")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(defaults, 1);

    let second = sqlx::query("INSERT INTO organizations (name, is_default) VALUES ('x', TRUE)")
        .execute(&pool)
        .await;
    assert!(second.is_err(), "a second default organization must be rejected");
}

/// Every table carries created_at/updated_at as timestamptz.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_timestamp_columns(pool: PgPool) {
    let tables = [
        "organizations",
        "cameras",
        "persons",
        "detection_logs",
        "face_images",
        "api_keys",
    ];
    for table in tables {
        for col in ["created_at", "updated_at"] {
            let data_type: Option<String> = sqlx::query_scalar(
                "SELECT data_type::TEXT FROM information_schema.columns \
                 WHERE table_schema = 'public' AND table_name::TEXT = $1 AND column_name::TEXT = $2",
            )
            .bind(table)
            .bind(col)
            .fetch_optional(&pool)
            .await
            .unwrap();
            assert_eq!(
                data_type.as_deref(),
                Some("timestamp with time zone"),
                "{table}.{col}"
            );
        }
    }
}
