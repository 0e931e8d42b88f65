use rusqlite::Connection;
use tracing::debug;

use crate::db::user_repo;
use crate::error::SlifeError;
use crate::models::{User, UserTask};
use crate::service::lifecycle;

/// Create an account and run the explicit post-registration steps: grant a
/// skill row for every existing catalog skill, and reattribute any task
/// confirmations the visitor made anonymously before signing up.
pub fn register_user(
    conn: &Connection,
    username: &str,
    session_id: Option<&str>,
) -> Result<(User, Vec<UserTask>), SlifeError> {
    let id = ulid::Ulid::new().to_string();

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<(User, Vec<UserTask>), SlifeError> {
        let user = user_repo::create_user(conn, &id, username)?;
        user_repo::grant_initial_skills(conn, &user.id)?;
        let merged = match session_id {
            Some(session) => lifecycle::merge_on_registration(conn, &user.id, session)?,
            None => Vec::new(),
        };
        Ok((user, merged))
    })();

    match result {
        Ok((user, merged)) => {
            conn.execute_batch("COMMIT")?;
            debug!(username = %user.username, merged = merged.len(), "user registered");
            Ok((user, merged))
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}
