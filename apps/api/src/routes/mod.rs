pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;
use crate::{applications, auth, bookmarks, jobs, resumes};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/auth/register", post(auth::handlers::register))
        .route("/auth/login", post(auth::handlers::login))
        .route("/auth/refresh", post(auth::handlers::refresh))
        .route("/auth/profile", put(auth::handlers::update_profile))
        .route("/auth/info", get(auth::handlers::get_info))
        .route("/auth/delete", delete(auth::handlers::delete_account))
        // Jobs
        .route(
            "/jobs",
            get(jobs::handlers::list_jobs).post(jobs::handlers::create_job),
        )
        .route("/jobs/search", get(jobs::handlers::search_jobs))
        .route("/jobs/filter", get(jobs::handlers::filter_jobs))
        .route("/jobs/sort", get(jobs::handlers::sort_jobs))
        .route(
            "/jobs/:id",
            get(jobs::handlers::get_job_detail)
                .put(jobs::handlers::update_job)
                .delete(jobs::handlers::delete_job),
        )
        // Applications
        .route(
            "/applications",
            post(applications::handlers::apply).get(applications::handlers::list_applications),
        )
        .route(
            "/applications/:id",
            delete(applications::handlers::cancel_application),
        )
        // Bookmarks
        .route(
            "/bookmarks",
            post(bookmarks::handlers::toggle_bookmark).get(bookmarks::handlers::list_bookmarks),
        )
        // Resumes
        .route(
            "/resumes",
            post(resumes::handlers::create_resume).get(resumes::handlers::list_resumes),
        )
        .route("/resumes/:id", put(resumes::handlers::update_resume))
        .with_state(state)
}
