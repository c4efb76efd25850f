//! Insert-or-get helpers for rows created on first reference.
//!
//! Companies and tags carry UNIQUE name constraints; resolution goes through
//! `ON CONFLICT` so two concurrent creates of the same name both land on the
//! existing row instead of racing a check-then-insert. Shared by the job
//! create/update handlers and the CSV loader.

use sqlx::PgConnection;

/// Returns the id for a company name, inserting the row if it does not exist.
/// `location_id` and `link` only apply on first insert.
pub async fn company_id(
    conn: &mut PgConnection,
    name: &str,
    location_id: i64,
    link: Option<&str>,
) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        "INSERT INTO companies (name, location_id, link) VALUES ($1, $2, $3)
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
         RETURNING id",
    )
    .bind(name)
    .bind(location_id)
    .bind(link)
    .fetch_one(conn)
    .await
}

/// Returns the id for a tag name, inserting the row if it does not exist.
pub async fn tag_id(conn: &mut PgConnection, name: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        "INSERT INTO tags (name) VALUES ($1)
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
         RETURNING id",
    )
    .bind(name)
    .fetch_one(conn)
    .await
}

/// Attaches a tag to a job; duplicate pairs are ignored.
pub async fn attach_job_tag(conn: &mut PgConnection, job_id: i64, tag_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO job_tags (job_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(job_id)
        .bind(tag_id)
        .execute(conn)
        .await?;
    Ok(())
}
