use rusqlite::Connection;

use crate::db::{social_repo, user_repo};
use crate::error::SlifeError;
use crate::models::LikeTarget;

/// Like a post or comment. The like record and the counter recount land in
/// one transaction, so `likes_count` can never be observed out of step with
/// the like set. Liking twice is an explicit `AlreadyLiked` error.
pub fn like(conn: &Connection, user_ref: &str, target: LikeTarget) -> Result<i64, SlifeError> {
    let user = user_repo::resolve_user(conn, user_ref)?;
    ensure_content_exists(conn, target)?;
    let id = ulid::Ulid::new().to_string();

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<i64, SlifeError> {
        social_repo::insert_like(conn, &id, &user.id, target)?;
        social_repo::recount_likes(conn, target)
    })();

    match result {
        Ok(count) => {
            conn.execute_batch("COMMIT")?;
            Ok(count)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

/// Remove a like. Removing one that does not exist is `NotFound`.
pub fn unlike(conn: &Connection, user_ref: &str, target: LikeTarget) -> Result<i64, SlifeError> {
    let user = user_repo::resolve_user(conn, user_ref)?;
    ensure_content_exists(conn, target)?;

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<i64, SlifeError> {
        if !social_repo::delete_like(conn, &user.id, target)? {
            return Err(SlifeError::not_found("Like", target.content_id()));
        }
        social_repo::recount_likes(conn, target)
    })();

    match result {
        Ok(count) => {
            conn.execute_batch("COMMIT")?;
            Ok(count)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

fn ensure_content_exists(conn: &Connection, target: LikeTarget) -> Result<(), SlifeError> {
    match target {
        LikeTarget::Post(id) => social_repo::get_post(conn, id).map(|_| ()),
        LikeTarget::Comment(id) => social_repo::get_comment(conn, id).map(|_| ()),
    }
}
