//! Loads crawler CSV output into the database.
//!
//! The same CSV feeds three loaders: `load_locations_csv` and `load_tags_csv`
//! seed the lookup tables from the 지역 and 직무 분야 columns, and
//! `load_jobs_csv` inserts the job rows themselves. Each job row commits in
//! its own transaction so one bad row never takes down the batch.

use anyhow::{Context, Result};
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::BTreeSet;
use std::path::Path;

use super::normalize;
use crate::jobs::upsert;
use crate::lookup::LookupCache;

/// One row of crawler output, keyed by the CSV header names.
#[derive(Debug, Deserialize)]
pub struct CsvJobRow {
    #[serde(rename = "채용 제목")]
    pub title: String,
    #[serde(rename = "채용 링크")]
    pub link: String,
    #[serde(rename = "회사명")]
    pub company: String,
    #[serde(rename = "회사 링크")]
    pub company_link: String,
    #[serde(rename = "지역")]
    pub location: String,
    #[serde(rename = "경력")]
    pub career: String,
    #[serde(rename = "학력")]
    pub education: String,
    #[serde(rename = "고용형태")]
    pub employment_type: String,
    #[serde(rename = "연봉")]
    pub salary: String,
    #[serde(rename = "직무 분야")]
    pub sectors: String,
    #[serde(rename = "등록일")]
    pub register_date: String,
    #[serde(rename = "마감일")]
    pub deadline: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub inserted: usize,
    pub skipped: usize,
}

fn read_rows(path: &Path) -> Result<Vec<CsvJobRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: CsvJobRow = record.context("Malformed CSV row")?;
        rows.push(row);
    }
    Ok(rows)
}

/// Turns the missing-field placeholder into SQL NULL.
fn opt_field(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != normalize::MISSING).then_some(value)
}

/// Seeds the locations table from the 지역 column. Existing rows are left
/// alone.
pub async fn load_locations_csv(pool: &PgPool, path: &Path) -> Result<usize> {
    let rows = read_rows(path)?;
    let pairs: BTreeSet<(String, String)> = rows
        .iter()
        .filter_map(|row| opt_field(&row.location))
        .map(normalize::split_location)
        .collect();

    let mut inserted = 0;
    for (region, district) in &pairs {
        let result = sqlx::query(
            "INSERT INTO locations (region, district) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(region)
        .bind(district)
        .execute(pool)
        .await?;
        inserted += result.rows_affected() as usize;
    }
    tracing::info!(distinct = pairs.len(), inserted, "Seeded locations");
    Ok(inserted)
}

/// Seeds the tags table from the 직무 분야 column. Existing rows are left
/// alone.
pub async fn load_tags_csv(pool: &PgPool, path: &Path) -> Result<usize> {
    let rows = read_rows(path)?;
    let names: BTreeSet<String> = rows
        .iter()
        .filter_map(|row| opt_field(&row.sectors))
        .flat_map(|sectors| sectors.split(','))
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();

    let mut inserted = 0;
    for name in &names {
        let result = sqlx::query("INSERT INTO tags (name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(name)
            .execute(pool)
            .await?;
        inserted += result.rows_affected() as usize;
    }
    tracing::info!(distinct = names.len(), inserted, "Seeded tags");
    Ok(inserted)
}

/// Loads job rows from crawler CSV output.
///
/// Rows already present (matched by listing link) and rows whose location is
/// not in the lookup cache are skipped. Each accepted row inserts the job,
/// its company and its tag links in one transaction.
pub async fn load_jobs_csv(
    pool: &PgPool,
    lookup: &LookupCache,
    path: &Path,
) -> Result<LoadSummary> {
    let rows = read_rows(path)?;
    let mut summary = LoadSummary::default();

    for row in rows {
        match load_job_row(pool, lookup, &row).await {
            Ok(true) => summary.inserted += 1,
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                tracing::error!(title = %row.title, error = %e, "Failed to load row, skipping");
                summary.skipped += 1;
            }
        }
    }

    tracing::info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        "CSV load finished"
    );
    Ok(summary)
}

async fn load_job_row(pool: &PgPool, lookup: &LookupCache, row: &CsvJobRow) -> Result<bool> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM jobs WHERE link = $1")
        .bind(&row.link)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let (region, district) = normalize::split_location(&row.location);
    let Some(location_id) = lookup.location_id(&region, &district).await else {
        tracing::warn!(title = %row.title, location = %row.location, "Unknown location, skipping");
        return Ok(false);
    };

    let register_date = opt_field(&row.register_date).and_then(normalize::parse_register_date);
    let deadline = opt_field(&row.deadline).and_then(normalize::parse_deadline);

    let mut tx = pool.begin().await?;
    let company_id = upsert::company_id(
        &mut tx,
        row.company.trim(),
        location_id,
        opt_field(&row.company_link),
    )
    .await?;

    let job_id: i64 = sqlx::query_scalar(
        "INSERT INTO jobs (title, company_id, location_id, career, education, employment,
                           salary, register_date, deadline, link)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING id",
    )
    .bind(row.title.trim())
    .bind(company_id)
    .bind(location_id)
    .bind(opt_field(&row.career))
    .bind(opt_field(&row.education))
    .bind(opt_field(&row.employment_type))
    .bind(opt_field(&row.salary))
    .bind(register_date)
    .bind(deadline)
    .bind(row.link.trim())
    .fetch_one(&mut *tx)
    .await?;

    let mut new_tags = Vec::new();
    if let Some(sectors) = opt_field(&row.sectors) {
        for name in sectors.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let tag_id = upsert::tag_id(&mut tx, name).await?;
            upsert::attach_job_tag(&mut tx, job_id, tag_id).await?;
            new_tags.push((name.to_string(), tag_id));
        }
    }
    tx.commit().await?;

    for (name, id) in new_tags {
        lookup.insert_tag(&name, id).await;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE_CSV: &str = "\
채용 제목,채용 링크,회사명,회사 링크,지역,경력,학력,고용형태,연봉,직무 분야,등록일,마감일
백엔드 엔지니어,https://example.com/jobs/1,테스트컴퍼니,https://example.com/co/1,서울 강남구,경력 3년,대졸,정규직,정보 없음,\"백엔드, Python\",2024/06/01,상시채용
";

    #[test]
    fn test_csv_rows_deserialize_by_korean_header() {
        let mut reader = csv::Reader::from_reader(SAMPLE_CSV.as_bytes());
        let rows: Vec<CsvJobRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.title, "백엔드 엔지니어");
        assert_eq!(row.company, "테스트컴퍼니");
        assert_eq!(row.location, "서울 강남구");
        assert_eq!(row.sectors, "백엔드, Python");
        assert_eq!(row.deadline, "상시채용");
    }

    #[test]
    fn test_opt_field_nulls_placeholder() {
        assert_eq!(opt_field("정보 없음"), None);
        assert_eq!(opt_field("  "), None);
        assert_eq!(opt_field("정규직"), Some("정규직"));
    }

    #[test]
    fn test_sample_row_normalizes() {
        let mut reader = csv::Reader::from_reader(SAMPLE_CSV.as_bytes());
        let row: CsvJobRow = reader.deserialize().next().unwrap().unwrap();

        let (region, district) = normalize::split_location(&row.location);
        assert_eq!((region.as_str(), district.as_str()), ("서울", "강남구"));
        assert_eq!(
            opt_field(&row.deadline).and_then(normalize::parse_deadline),
            NaiveDate::from_ymd_opt(9999, 12, 30)
        );
        assert_eq!(opt_field(&row.salary), None);
    }
}
