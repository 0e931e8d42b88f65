use rusqlite::{params, Connection};

use crate::error::SlifeError;
use crate::models::{CatalogTask, Category, Difficulty, Skill, TaskReward};

pub fn create_skill(conn: &Connection, id: &str, title: &str) -> Result<Skill, SlifeError> {
    conn.execute(
        "INSERT INTO skills (id, title) VALUES (?1, ?2)",
        params![id, title],
    )?;
    Ok(Skill {
        id: id.to_string(),
        title: title.to_string(),
    })
}

pub fn resolve_skill(conn: &Connection, reference: &str) -> Result<Skill, SlifeError> {
    conn.query_row(
        "SELECT id, title FROM skills WHERE title = ?1 OR id = ?1",
        params![reference],
        |row| {
            Ok(Skill {
                id: row.get(0)?,
                title: row.get(1)?,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => SlifeError::not_found("Skill", reference),
        _ => SlifeError::from(e),
    })
}

pub fn create_category(
    conn: &Connection,
    id: &str,
    title: &str,
    slug: &str,
) -> Result<Category, SlifeError> {
    conn.execute(
        "INSERT INTO categories (id, title, slug) VALUES (?1, ?2, ?3)",
        params![id, title, slug],
    )?;
    Ok(Category {
        id: id.to_string(),
        title: title.to_string(),
        slug: slug.to_string(),
    })
}

pub fn resolve_category(conn: &Connection, slug: &str) -> Result<Category, SlifeError> {
    conn.query_row(
        "SELECT id, title, slug FROM categories WHERE slug = ?1 OR id = ?1",
        params![slug],
        |row| {
            Ok(Category {
                id: row.get(0)?,
                title: row.get(1)?,
                slug: row.get(2)?,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => SlifeError::not_found("Category", slug),
        _ => SlifeError::from(e),
    })
}

#[allow(clippy::too_many_arguments)]
pub fn create_task(
    conn: &Connection,
    id: &str,
    title: &str,
    slug: &str,
    description: &str,
    short_description: &str,
    hint: Option<&str>,
    difficulty: Difficulty,
) -> Result<CatalogTask, SlifeError> {
    conn.execute(
        "INSERT INTO catalog_tasks (id, title, slug, description, short_description, hint, difficulty)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![id, title, slug, description, short_description, hint, difficulty.as_str()],
    )?;
    get_task_by_id(conn, id)
}

pub fn get_task_by_id(conn: &Connection, id: &str) -> Result<CatalogTask, SlifeError> {
    conn.query_row(
        "SELECT id, title, slug, description, short_description, hint, difficulty
         FROM catalog_tasks WHERE id = ?1",
        params![id],
        row_to_task,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => SlifeError::not_found("Catalog task", id),
        _ => SlifeError::from(e),
    })
}

/// Resolve a catalog task by slug or ID.
pub fn resolve_task(conn: &Connection, reference: &str) -> Result<CatalogTask, SlifeError> {
    conn.query_row(
        "SELECT id, title, slug, description, short_description, hint, difficulty
         FROM catalog_tasks WHERE slug = ?1 OR id = ?1",
        params![reference],
        row_to_task,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => SlifeError::not_found("Catalog task", reference),
        _ => SlifeError::from(e),
    })
}

/// List catalog tasks, optionally filtered by category. When `exclude_for`
/// is given, tasks that user already holds in a non-canceled instance are
/// left out, so the catalog only offers what the user can still start.
pub fn list_tasks(
    conn: &Connection,
    category_id: Option<&str>,
    exclude_for: Option<&str>,
) -> Result<Vec<CatalogTask>, SlifeError> {
    let mut sql = String::from(
        "SELECT t.id, t.title, t.slug, t.description, t.short_description, t.hint, t.difficulty
         FROM catalog_tasks t",
    );
    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<&str> = Vec::new();

    if let Some(cat) = category_id {
        sql.push_str(" JOIN task_categories tc ON tc.task_id = t.id");
        clauses.push("tc.category_id = ?");
        args.push(cat);
    }
    if let Some(user) = exclude_for {
        clauses.push(
            "t.id NOT IN (SELECT task_id FROM users_tasks
                          WHERE initiator_id = ? AND status != 'canceled')",
        );
        args.push(user);
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY t.title ASC");

    let mut stmt = conn.prepare(&sql)?;
    let tasks = stmt
        .query_map(rusqlite::params_from_iter(args), row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn add_task_category(
    conn: &Connection,
    task_id: &str,
    category_id: &str,
) -> Result<(), SlifeError> {
    conn.execute(
        "INSERT OR IGNORE INTO task_categories (task_id, category_id) VALUES (?1, ?2)",
        params![task_id, category_id],
    )?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn add_task_reward(
    conn: &Connection,
    id: &str,
    task_id: &str,
    skill_id: &str,
    quantity: i64,
    is_additional: bool,
    description: Option<&str>,
) -> Result<(), SlifeError> {
    conn.execute(
        "INSERT INTO task_rewards (id, task_id, skill_id, quantity, is_additional, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, task_id, skill_id, quantity, is_additional, description],
    )?;
    Ok(())
}

/// Reward line-items of a task, guaranteed first.
pub fn list_task_rewards(conn: &Connection, task_id: &str) -> Result<Vec<TaskReward>, SlifeError> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.task_id, r.skill_id, s.title, r.quantity, r.is_additional, r.description
         FROM task_rewards r JOIN skills s ON s.id = r.skill_id
         WHERE r.task_id = ?1 ORDER BY r.is_additional ASC, s.title ASC",
    )?;
    let rewards = stmt
        .query_map(params![task_id], |row| {
            Ok(TaskReward {
                id: row.get(0)?,
                task_id: row.get(1)?,
                skill_id: row.get(2)?,
                skill_title: row.get(3)?,
                quantity: row.get(4)?,
                is_additional: row.get(5)?,
                description: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rewards)
}

pub fn list_task_categories(conn: &Connection, task_id: &str) -> Result<Vec<Category>, SlifeError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.title, c.slug FROM categories c
         JOIN task_categories tc ON tc.category_id = c.id
         WHERE tc.task_id = ?1 ORDER BY c.title ASC",
    )?;
    let cats = stmt
        .query_map(params![task_id], |row| {
            Ok(Category {
                id: row.get(0)?,
                title: row.get(1)?,
                slug: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cats)
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<CatalogTask> {
    Ok(CatalogTask {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        short_description: row.get(4)?,
        hint: row.get(5)?,
        difficulty: Difficulty::from_str(&row.get::<_, String>(6)?).unwrap_or(Difficulty::Easy),
    })
}
