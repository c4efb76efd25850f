//! Job-board backend: HTTP API plus the offline crawler and CSV loader that
//! feed its database.

pub mod applications;
pub mod auth;
pub mod bookmarks;
pub mod config;
pub mod db;
pub mod errors;
pub mod ingest;
pub mod jobs;
pub mod lookup;
pub mod models;
pub mod response;
pub mod resumes;
pub mod routes;
pub mod state;
