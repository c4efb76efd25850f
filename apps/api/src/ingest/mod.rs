//! Offline ingestion: the saramin crawler and the CSV-to-database loader.
//! Both run as standalone binaries against the same schema as the API.

pub mod crawler;
pub mod loader;
pub mod normalize;
