use rusqlite::{params, Connection};

use crate::error::SlifeError;
use crate::models::Subscription;

use super::now_ts;

/// Get-or-create the directed edge `user → subscribing`. Returns the edge
/// and whether it was newly created. The UNIQUE constraint on the pair makes
/// this safe against a concurrent insert of the same edge.
pub fn get_or_create(
    conn: &Connection,
    user_id: &str,
    subscribing_id: &str,
) -> Result<(Subscription, bool), SlifeError> {
    if let Some(existing) = find(conn, user_id, subscribing_id)? {
        return Ok((existing, false));
    }
    let id = ulid::Ulid::new().to_string();
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO subscriptions (id, user_id, subscribing_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![id, user_id, subscribing_id, now_ts()],
    )?;
    match find(conn, user_id, subscribing_id)? {
        Some(edge) => Ok((edge, inserted == 1)),
        None => Err(SlifeError::database("subscription insert did not land")),
    }
}

pub fn find(
    conn: &Connection,
    user_id: &str,
    subscribing_id: &str,
) -> Result<Option<Subscription>, SlifeError> {
    use rusqlite::OptionalExtension;
    let edge = conn
        .query_row(
            "SELECT id, user_id, subscribing_id, created_at FROM subscriptions
             WHERE user_id = ?1 AND subscribing_id = ?2",
            params![user_id, subscribing_id],
            row_to_subscription,
        )
        .optional()?;
    Ok(edge)
}

pub fn delete(conn: &Connection, user_id: &str, subscribing_id: &str) -> Result<bool, SlifeError> {
    let deleted = conn.execute(
        "DELETE FROM subscriptions WHERE user_id = ?1 AND subscribing_id = ?2",
        params![user_id, subscribing_id],
    )?;
    Ok(deleted == 1)
}

/// Users that `user_id` follows.
pub fn list_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Subscription>, SlifeError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, subscribing_id, created_at FROM subscriptions
         WHERE user_id = ?1 ORDER BY created_at ASC",
    )?;
    let edges = stmt
        .query_map(params![user_id], row_to_subscription)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(edges)
}

fn row_to_subscription(row: &rusqlite::Row) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        subscribing_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}
