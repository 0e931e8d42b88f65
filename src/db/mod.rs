pub mod catalog_repo;
pub mod connection;
pub mod device_repo;
pub mod migrations;
pub mod social_repo;
pub mod subscription_repo;
pub mod task_repo;
pub mod user_repo;

pub use connection::*;

/// Timestamp written by every repo mutation, RFC 3339 in UTC.
pub fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339()
}
