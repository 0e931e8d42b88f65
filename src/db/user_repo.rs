use rusqlite::{params, Connection};

use crate::error::SlifeError;
use crate::models::{User, UserSkill};

use super::now_ts;

pub fn create_user(conn: &Connection, id: &str, username: &str) -> Result<User, SlifeError> {
    conn.execute(
        "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3)",
        params![id, username, now_ts()],
    )
    .map_err(|e| {
        let err = SlifeError::from(e);
        if err.is_unique_violation() {
            SlifeError::validation(format!("Username '{username}' is already taken"))
        } else {
            err
        }
    })?;
    get_user_by_id(conn, id)
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<User, SlifeError> {
    conn.query_row(
        "SELECT id, username, created_at FROM users WHERE id = ?1",
        params![id],
        row_to_user,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => SlifeError::user_not_found(id),
        _ => SlifeError::from(e),
    })
}

/// Resolve a user by exact username, exact ID, or unique ID prefix.
pub fn resolve_user(conn: &Connection, reference: &str) -> Result<User, SlifeError> {
    if let Ok(user) = conn.query_row(
        "SELECT id, username, created_at FROM users WHERE username = ?1 OR id = ?1",
        params![reference],
        row_to_user,
    ) {
        return Ok(user);
    }

    let mut stmt =
        conn.prepare("SELECT id, username, created_at FROM users WHERE id LIKE ?1")?;
    let prefix = format!("{reference}%");
    let users: Vec<User> = stmt
        .query_map(params![prefix], row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;

    match users.len() {
        1 => Ok(users.into_iter().next().unwrap()),
        _ => Err(SlifeError::user_not_found(reference)),
    }
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, SlifeError> {
    let mut stmt =
        conn.prepare("SELECT id, username, created_at FROM users ORDER BY username ASC")?;
    let users = stmt
        .query_map([], row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Grant the user a row for every existing skill at the initial level.
/// Invoked explicitly by the registration workflow.
pub fn grant_initial_skills(conn: &Connection, user_id: &str) -> Result<(), SlifeError> {
    conn.execute(
        "INSERT OR IGNORE INTO user_skills (user_id, skill_id, level, experience)
         SELECT ?1, id, 1, 0 FROM skills",
        params![user_id],
    )?;
    Ok(())
}

pub fn list_user_skills(conn: &Connection, user_id: &str) -> Result<Vec<UserSkill>, SlifeError> {
    let mut stmt = conn.prepare(
        "SELECT us.user_id, us.skill_id, s.title, us.level, us.experience
         FROM user_skills us JOIN skills s ON s.id = us.skill_id
         WHERE us.user_id = ?1 ORDER BY s.title ASC",
    )?;
    let skills = stmt
        .query_map(params![user_id], |row| {
            Ok(UserSkill {
                user_id: row.get(0)?,
                skill_id: row.get(1)?,
                skill_title: row.get(2)?,
                level: row.get(3)?,
                experience: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(skills)
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: row.get(2)?,
    })
}
