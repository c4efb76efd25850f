//! Handler tests against a real PostgreSQL database. `#[sqlx::test]` gives
//! each test a fresh database with the crate's migrations applied.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::PgPool;

use jobboard_api::applications::handlers::{self as applications, ApplyRequest, ListParams};
use jobboard_api::auth::handlers::{self as auth, UpdateProfileRequest};
use jobboard_api::auth::AuthUser;
use jobboard_api::bookmarks::handlers::{self as bookmarks, ToggleRequest};
use jobboard_api::config::Config;
use jobboard_api::errors::AppError;
use jobboard_api::lookup::LookupCache;
use jobboard_api::response::PageParams;
use jobboard_api::resumes::handlers::{self as resumes, ResumeRequest};
use jobboard_api::state::AppState;

fn test_state(pool: PgPool) -> AppState {
    AppState {
        db: pool,
        config: Config {
            database_url: String::new(),
            jwt_access_secret: "test-access-secret".to_string(),
            jwt_refresh_secret: "test-refresh-secret".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
            port: 0,
            rust_log: "info".to_string(),
        },
        lookup: Arc::new(LookupCache::default()),
    }
}

async fn seed_user(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (email, password, name) VALUES ($1, 'hash', '테스트') RETURNING id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_job(pool: &PgPool, title: &str) -> i64 {
    let location_id: i64 = sqlx::query_scalar(
        "INSERT INTO locations (region, district) VALUES ('서울', '전체')
         ON CONFLICT (region, district) DO UPDATE SET region = EXCLUDED.region
         RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    let company_id: i64 = sqlx::query_scalar(
        "INSERT INTO companies (name, location_id) VALUES ('테스트컴퍼니', $1)
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
         RETURNING id",
    )
    .bind(location_id)
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query_scalar(
        "INSERT INTO jobs (title, company_id, location_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(title)
    .bind(company_id)
    .bind(location_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn count_for_user(pool: &PgPool, table: &str, user_id: i64) -> i64 {
    sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {table} WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[sqlx::test]
async fn cancel_only_transitions_pending_applications(pool: PgPool) {
    let state = test_state(pool.clone());
    let user = AuthUser {
        user_id: seed_user(&pool, "cancel@test.kr").await,
    };
    let job_id = seed_job(&pool, "백엔드 엔지니어").await;

    let (status, Json(body)) = applications::apply(
        State(state.clone()),
        user,
        Json(ApplyRequest {
            job_id: Some(job_id),
            resume_link: None,
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    let application_id = body.data.unwrap().application_id;

    let Json(body) =
        applications::cancel_application(State(state.clone()), user, Path(application_id))
            .await
            .unwrap();
    assert_eq!(
        body.message.as_deref(),
        Some("Application status updated to 'canceled'")
    );
    let stored: String = sqlx::query_scalar("SELECT status FROM applications WHERE id = $1")
        .bind(application_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, "canceled");

    // A canceled application is no longer pending, so a second cancel fails.
    let err = applications::cancel_application(State(state), user, Path(application_id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[sqlx::test]
async fn delete_account_removes_all_owned_rows(pool: PgPool) {
    let state = test_state(pool.clone());
    let user_id = seed_user(&pool, "gone@test.kr").await;
    let bystander_id = seed_user(&pool, "stays@test.kr").await;
    let job_id = seed_job(&pool, "데이터 엔지니어").await;

    for owner in [user_id, bystander_id] {
        let resume_id: i64 = sqlx::query_scalar(
            "INSERT INTO resumes (user_id, content) VALUES ($1, 'https://cv.test/1') RETURNING id",
        )
        .bind(owner)
        .fetch_one(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO applications (user_id, job_id, resume_id) VALUES ($1, $2, $3)",
        )
        .bind(owner)
        .bind(job_id)
        .bind(resume_id)
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO favorites (user_id, job_id) VALUES ($1, $2)")
            .bind(owner)
            .bind(job_id)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO refresh_tokens (user_id, token) VALUES ($1, 'tok')")
            .bind(owner)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO login_history (user_id) VALUES ($1)")
            .bind(owner)
            .execute(&pool)
            .await
            .unwrap();
    }

    auth::delete_account(State(state), AuthUser { user_id })
        .await
        .unwrap();

    for table in [
        "resumes",
        "applications",
        "favorites",
        "refresh_tokens",
        "login_history",
    ] {
        assert_eq!(count_for_user(&pool, table, user_id).await, 0, "{table}");
        assert_eq!(count_for_user(&pool, table, bystander_id).await, 1, "{table}");
    }
    let user_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(user_rows, 0);
}

#[sqlx::test]
async fn bookmark_toggle_twice_returns_to_absent(pool: PgPool) {
    let state = test_state(pool.clone());
    let user = AuthUser {
        user_id: seed_user(&pool, "bookmark@test.kr").await,
    };
    let job_id = seed_job(&pool, "프론트엔드 엔지니어").await;
    let request = || {
        Json(ToggleRequest {
            job_id: Some(job_id),
        })
    };

    let (status, Json(body)) = bookmarks::toggle_bookmark(State(state.clone()), user, request())
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.message.as_deref(), Some("Bookmark added"));
    assert_eq!(count_for_user(&pool, "favorites", user.user_id).await, 1);

    let (status, Json(body)) = bookmarks::toggle_bookmark(State(state), user, request())
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.message.as_deref(), Some("Bookmark removed"));
    assert_eq!(count_for_user(&pool, "favorites", user.user_id).await, 0);
}

#[sqlx::test]
async fn applications_list_defaults_to_oldest_first(pool: PgPool) {
    let state = test_state(pool.clone());
    let user = AuthUser {
        user_id: seed_user(&pool, "order@test.kr").await,
    };
    let first_job = seed_job(&pool, "첫번째 공고").await;
    let second_job = seed_job(&pool, "두번째 공고").await;

    for (job_id, applied_at) in [
        (first_job, "2024-06-01T09:00:00Z"),
        (second_job, "2024-06-02T09:00:00Z"),
    ] {
        sqlx::query(
            "INSERT INTO applications (user_id, job_id, applied_at) VALUES ($1, $2, $3::timestamptz)",
        )
        .bind(user.user_id)
        .bind(job_id)
        .bind(applied_at)
        .execute(&pool)
        .await
        .unwrap();
    }

    let Json(body) = applications::list_applications(
        State(state),
        user,
        Query(ListParams {
            status: None,
            order: None,
        }),
        Query(PageParams::default()),
    )
    .await
    .unwrap();

    let listed = body.data.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].job_id, first_job);
    assert_eq!(listed[1].job_id, second_job);
}

#[sqlx::test]
async fn create_resume_reports_created(pool: PgPool) {
    let state = test_state(pool.clone());
    let user = AuthUser {
        user_id: seed_user(&pool, "resume@test.kr").await,
    };

    let (status, Json(body)) = resumes::create_resume(
        State(state),
        user,
        Json(ResumeRequest {
            resume_link: Some("https://cv.test/me".to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.message.as_deref(), Some("Resume created successfully"));
    let resume_id = body.data.unwrap().resume_id;
    let content: String = sqlx::query_scalar("SELECT content FROM resumes WHERE id = $1")
        .bind(resume_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(content, "https://cv.test/me");
}

#[sqlx::test]
async fn update_profile_treats_empty_strings_as_absent(pool: PgPool) {
    let state = test_state(pool.clone());
    let user = AuthUser {
        user_id: seed_user(&pool, "profile@test.kr").await,
    };

    let err = auth::update_profile(
        State(state),
        user,
        Json(UpdateProfileRequest {
            password: Some(String::new()),
            name: Some(String::new()),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let name: String = sqlx::query_scalar("SELECT name FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(name, "테스트");
}
