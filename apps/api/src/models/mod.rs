pub mod application;
pub mod bookmark;
pub mod job;
pub mod resume;
pub mod user;
