use rusqlite::{params, Connection};

use crate::error::SlifeError;
use crate::models::DeviceToken;

use super::now_ts;

/// Register (or refresh) a push token. Tokens are globally unique: if the
/// same token was registered under another user, that record is replaced.
pub fn register(
    conn: &Connection,
    id: &str,
    token: &str,
    platform: &str,
    user_id: &str,
) -> Result<DeviceToken, SlifeError> {
    conn.execute(
        "DELETE FROM device_tokens WHERE token = ?1",
        params![token],
    )?;
    conn.execute(
        "INSERT INTO device_tokens (id, token, platform, user_id, last_used_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, token, platform, user_id, now_ts()],
    )?;
    conn.query_row(
        "SELECT id, token, platform, user_id, last_used_at FROM device_tokens WHERE id = ?1",
        params![id],
        row_to_device,
    )
    .map_err(SlifeError::from)
}

pub fn unregister(conn: &Connection, token: &str) -> Result<bool, SlifeError> {
    let deleted = conn.execute(
        "DELETE FROM device_tokens WHERE token = ?1",
        params![token],
    )?;
    Ok(deleted == 1)
}

/// All push tokens registered by one user, oldest first.
pub fn tokens_for_user(conn: &Connection, user_id: &str) -> Result<Vec<String>, SlifeError> {
    let mut stmt = conn.prepare(
        "SELECT token FROM device_tokens WHERE user_id = ?1 ORDER BY last_used_at ASC",
    )?;
    let tokens = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tokens)
}

pub fn touch(conn: &Connection, token: &str) -> Result<(), SlifeError> {
    conn.execute(
        "UPDATE device_tokens SET last_used_at = ?2 WHERE token = ?1",
        params![token, now_ts()],
    )?;
    Ok(())
}

fn row_to_device(row: &rusqlite::Row) -> rusqlite::Result<DeviceToken> {
    Ok(DeviceToken {
        id: row.get(0)?,
        token: row.get(1)?,
        platform: row.get(2)?,
        user_id: row.get(3)?,
        last_used_at: row.get(4)?,
    })
}
