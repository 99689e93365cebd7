//! Person ledger: the only writer of the `persons` table.
//!
//! Mutations take a `&mut PgConnection` so the reconciler can run them inside
//! the same transaction as the detection-log insert. Concurrency is handled by
//! the partial unique index `uq_persons_hash_org` and single-statement
//! updates, never by in-process locks.

use sqlx::{PgConnection, PgPool};
use manta_core::pagination::PageRequest;
use manta_core::types::{DbId, Timestamp};

use crate::models::person::{Person, PersonVisitStats};

const COLUMNS: &str = "id, person_hash, organization_id, first_seen, last_seen, visit_count, \
    created_at, updated_at";

pub struct PersonRepo;

impl PersonRepo {
    /// Find the live person for `(person_hash, organization_id)`.
    pub async fn find(
        pool: &PgPool,
        person_hash: &str,
        organization_id: DbId,
    ) -> Result<Option<Person>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::find_with(&mut conn, person_hash, organization_id).await
    }

    pub async fn find_with(
        conn: &mut PgConnection,
        person_hash: &str,
        organization_id: DbId,
    ) -> Result<Option<Person>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM persons \
             WHERE person_hash = $1 AND organization_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(person_hash)
            .bind(organization_id)
            .fetch_optional(conn)
            .await
    }

    /// Insert the person with `visit_count = 1` unless a live row already exists.
    ///
    /// Returns the row and whether this call created it. Under concurrent
    /// callers exactly one observes `true`: the losing insert waits on the
    /// unique index, does nothing, and the follow-up read sees the winner.
    pub async fn create_if_absent(
        conn: &mut PgConnection,
        person_hash: &str,
        organization_id: DbId,
        seen_at: Timestamp,
    ) -> Result<(Person, bool), sqlx::Error> {
        let query = format!(
            "INSERT INTO persons (person_hash, organization_id, first_seen, last_seen, visit_count) \
             VALUES ($1, $2, $3, $3, 1) \
             ON CONFLICT (person_hash, organization_id) WHERE deleted_at IS NULL DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Person>(&query)
            .bind(person_hash)
            .bind(organization_id)
            .bind(seen_at)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(person) = inserted {
            return Ok((person, true));
        }

        match Self::find_with(conn, person_hash, organization_id).await? {
            Some(person) => Ok((person, false)),
            // The conflicting row vanished between the two statements.
            None => Err(sqlx::Error::RowNotFound),
        }
    }

    /// Count one more visit and widen the seen range to include `seen_at`.
    ///
    /// Returns `None` when no live person matched.
    pub async fn record_visit(
        conn: &mut PgConnection,
        person_hash: &str,
        organization_id: DbId,
        seen_at: Timestamp,
    ) -> Result<Option<Person>, sqlx::Error> {
        let query = format!(
            "UPDATE persons SET
                visit_count = visit_count + 1,
                last_seen = GREATEST(last_seen, $3),
                first_seen = LEAST(first_seen, $3)
             WHERE person_hash = $1 AND organization_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(person_hash)
            .bind(organization_id)
            .bind(seen_at)
            .fetch_optional(conn)
            .await
    }

    /// List an organization's persons, most recently seen first.
    pub async fn list(
        pool: &PgPool,
        organization_id: DbId,
        page: &PageRequest,
    ) -> Result<Vec<Person>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM persons \
             WHERE organization_id = $1 AND deleted_at IS NULL \
             ORDER BY last_seen DESC, id DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(organization_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, organization_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM persons WHERE organization_id = $1 AND deleted_at IS NULL",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await
    }

    /// Visit statistics for one person, computed from the detection logs.
    pub async fn visit_stats(
        pool: &PgPool,
        person_hash: &str,
        organization_id: DbId,
    ) -> Result<Option<PersonVisitStats>, sqlx::Error> {
        let Some(person) = Self::find(pool, person_hash, organization_id).await? else {
            return Ok(None);
        };

        let (total_visits, face_image_count): (i64, i64) = sqlx::query_as(
            "SELECT \
                (SELECT COUNT(*) FROM detection_logs \
                  WHERE person_hash = $1 AND organization_id = $2 AND deleted_at IS NULL), \
                (SELECT COUNT(*) FROM face_images \
                  WHERE person_hash = $1 AND organization_id = $2 AND deleted_at IS NULL)",
        )
        .bind(person_hash)
        .bind(organization_id)
        .fetch_one(pool)
        .await?;

        Ok(Some(PersonVisitStats {
            person_hash: person.person_hash,
            organization_id,
            total_visits,
            new: 1,
            repeat: (total_visits - 1).max(0),
            face_image_count,
            first_seen: person.first_seen,
            last_seen: person.last_seen,
        }))
    }

    /// Soft-delete a person together with its detection logs and face images.
    ///
    /// All three updates commit together. Returns `false` (and changes
    /// nothing) when no live person matched.
    pub async fn soft_delete_cascade(
        pool: &PgPool,
        person_hash: &str,
        organization_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE persons SET deleted_at = NOW() \
             WHERE person_hash = $1 AND organization_id = $2 AND deleted_at IS NULL",
        )
        .bind(person_hash)
        .bind(organization_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        for table in ["detection_logs", "face_images"] {
            let query = format!(
                "UPDATE {table} SET deleted_at = NOW() \
                 WHERE person_hash = $1 AND organization_id = $2 AND deleted_at IS NULL"
            );
            sqlx::query(&query)
                .bind(person_hash)
                .bind(organization_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}
