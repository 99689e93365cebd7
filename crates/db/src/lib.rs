use sqlx::postgres::PgPoolOptions;

use manta_core::api_keys::generate_api_key;
use manta_core::types::DbId;

pub mod models;
pub mod repositories;

use models::api_key::CreateApiKey;
use repositories::{ApiKeyRepo, OrganizationRepo};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Result of [`bootstrap`].
#[derive(Debug)]
pub struct Bootstrap {
    pub default_organization_id: DbId,
    /// Plaintext of an admin key issued during this run, if one had to be created.
    pub issued_admin_key: Option<String>,
}

/// Make sure the default organization exists and has at least one usable key.
///
/// The migrations seed the organization; this recreates it if it was removed
/// and issues a first admin key when none is active.
pub async fn bootstrap(pool: &DbPool) -> Result<Bootstrap, sqlx::Error> {
    let default_organization_id = OrganizationRepo::ensure_default(pool).await?;

    if ApiKeyRepo::count_active(pool, default_organization_id).await? > 0 {
        return Ok(Bootstrap {
            default_organization_id,
            issued_admin_key: None,
        });
    }

    let generated = generate_api_key();
    let input = CreateApiKey {
        description: Some("Initial admin key".to_string()),
        expires_at: None,
    };
    ApiKeyRepo::create(
        pool,
        default_organization_id,
        &input,
        &generated.hash,
        &generated.prefix,
    )
    .await?;
    tracing::info!(
        organization_id = default_organization_id,
        key_prefix = %generated.prefix,
        "Issued initial admin API key"
    );

    Ok(Bootstrap {
        default_organization_id,
        issued_admin_key: Some(generated.plaintext),
    })
}
