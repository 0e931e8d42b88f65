use rusqlite::{params, Connection, OptionalExtension};

use crate::error::SlifeError;
use crate::models::{TaskStatus, UserTask};

use super::now_ts;

const INSTANCE_COLUMNS: &str = "id, task_id, initiator_id, target_user_id, target_user_name,
     status, invitation_token, rating, started_at, completed_at, confirmed_at";

pub fn create_instance(
    conn: &Connection,
    id: &str,
    task_id: &str,
    initiator_id: &str,
    target_user_id: Option<&str>,
    target_user_name: Option<&str>,
    invitation_token: &str,
) -> Result<UserTask, SlifeError> {
    conn.execute(
        "INSERT INTO users_tasks
             (id, task_id, initiator_id, target_user_id, target_user_name,
              status, invitation_token, started_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'started', ?6, ?7)",
        params![
            id,
            task_id,
            initiator_id,
            target_user_id,
            target_user_name,
            invitation_token,
            now_ts()
        ],
    )?;
    get_instance(conn, id)
}

pub fn get_instance(conn: &Connection, id: &str) -> Result<UserTask, SlifeError> {
    conn.query_row(
        &format!("SELECT {INSTANCE_COLUMNS} FROM users_tasks WHERE id = ?1"),
        params![id],
        row_to_instance,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => SlifeError::not_found("Task instance", id),
        _ => SlifeError::from(e),
    })
}

/// Resolve an instance by ID or unique ID prefix.
pub fn resolve_instance(conn: &Connection, reference: &str) -> Result<UserTask, SlifeError> {
    if let Ok(instance) = get_instance(conn, reference) {
        return Ok(instance);
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT {INSTANCE_COLUMNS} FROM users_tasks WHERE id LIKE ?1"
    ))?;
    let prefix = format!("{reference}%");
    let instances: Vec<UserTask> = stmt
        .query_map(params![prefix], row_to_instance)?
        .collect::<Result<Vec<_>, _>>()?;
    match instances.len() {
        1 => Ok(instances.into_iter().next().unwrap()),
        _ => Err(SlifeError::not_found("Task instance", reference)),
    }
}

/// Look up an instance by its stored invitation token, exact match only.
pub fn find_by_token(conn: &Connection, token: &str) -> Result<Option<UserTask>, SlifeError> {
    let instance = conn
        .query_row(
            &format!("SELECT {INSTANCE_COLUMNS} FROM users_tasks WHERE invitation_token = ?1"),
            params![token],
            row_to_instance,
        )
        .optional()?;
    Ok(instance)
}

pub fn list_by_initiator(conn: &Connection, initiator_id: &str) -> Result<Vec<UserTask>, SlifeError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INSTANCE_COLUMNS} FROM users_tasks
         WHERE initiator_id = ?1 ORDER BY started_at ASC"
    ))?;
    let instances = stmt
        .query_map(params![initiator_id], row_to_instance)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(instances)
}

/// Confirmed instances claimed by one anonymous session, i.e. those whose
/// token carries the session's composite prefix.
pub fn list_confirmed_by_session(
    conn: &Connection,
    session_prefix: &str,
) -> Result<Vec<UserTask>, SlifeError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INSTANCE_COLUMNS} FROM users_tasks
         WHERE status = 'confirmed'
           AND substr(invitation_token, 1, length(?1)) = ?1
         ORDER BY confirmed_at ASC"
    ))?;
    let instances = stmt
        .query_map(params![session_prefix], row_to_instance)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(instances)
}

/// Conditional transition `started → completed`. Returns false when the row
/// was not in `started` at write time, so a concurrent loser observes the
/// race instead of clobbering the winner.
pub fn mark_completed(conn: &Connection, id: &str) -> Result<bool, SlifeError> {
    let changed = conn.execute(
        "UPDATE users_tasks SET status = 'completed', completed_at = ?2
         WHERE id = ?1 AND status = 'started'",
        params![id, now_ts()],
    )?;
    Ok(changed == 1)
}

/// Conditional transition `completed → confirmed`, writing rating and the
/// late-bound target in the same statement. No partial update is possible:
/// either the row was `completed` and every field lands, or nothing does.
/// Binding a registered target clears any placeholder name, so at most one
/// of the two target columns is set afterward.
pub fn mark_confirmed(
    conn: &Connection,
    id: &str,
    rating: Option<i64>,
    bind_target_user_id: Option<&str>,
) -> Result<bool, SlifeError> {
    let changed = conn.execute(
        "UPDATE users_tasks SET
             status = 'confirmed',
             confirmed_at = ?2,
             rating = COALESCE(?3, rating),
             target_user_id = COALESCE(?4, target_user_id),
             target_user_name = CASE WHEN ?4 IS NOT NULL THEN NULL
                                     ELSE target_user_name END
         WHERE id = ?1 AND status = 'completed'",
        params![id, now_ts(), rating, bind_target_user_id],
    )?;
    Ok(changed == 1)
}

/// Conditional transition to `canceled` from any non-terminal status.
pub fn mark_canceled(conn: &Connection, id: &str) -> Result<bool, SlifeError> {
    let changed = conn.execute(
        "UPDATE users_tasks SET status = 'canceled'
         WHERE id = ?1 AND status IN ('started', 'completed')",
        params![id],
    )?;
    Ok(changed == 1)
}

/// Rewrite the invitation token to its claimed composite form.
pub fn rewrite_token(conn: &Connection, id: &str, token: &str) -> Result<(), SlifeError> {
    conn.execute(
        "UPDATE users_tasks SET invitation_token = ?2 WHERE id = ?1",
        params![id, token],
    )?;
    Ok(())
}

/// Backfill the target user on a reattributed instance.
pub fn bind_target_user(conn: &Connection, id: &str, user_id: &str) -> Result<(), SlifeError> {
    conn.execute(
        "UPDATE users_tasks SET target_user_id = ?2, target_user_name = NULL WHERE id = ?1",
        params![id, user_id],
    )?;
    Ok(())
}

fn row_to_instance(row: &rusqlite::Row) -> rusqlite::Result<UserTask> {
    Ok(UserTask {
        id: row.get(0)?,
        task_id: row.get(1)?,
        initiator_id: row.get(2)?,
        target_user_id: row.get(3)?,
        target_user_name: row.get(4)?,
        status: TaskStatus::from_str(&row.get::<_, String>(5)?).unwrap_or(TaskStatus::Started),
        invitation_token: row.get(6)?,
        rating: row.get(7)?,
        started_at: row.get(8)?,
        completed_at: row.get(9)?,
        confirmed_at: row.get(10)?,
    })
}
