use rusqlite::{params, Connection};

use crate::error::SlifeError;
use crate::models::{Comment, Like, LikeTarget, Post};

use super::now_ts;

pub fn create_post(
    conn: &Connection,
    id: &str,
    author_id: &str,
    text: &str,
) -> Result<Post, SlifeError> {
    let ts = now_ts();
    conn.execute(
        "INSERT INTO posts (id, author_id, text, pub_date, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![id, author_id, text, ts],
    )?;
    get_post(conn, id)
}

pub fn get_post(conn: &Connection, id: &str) -> Result<Post, SlifeError> {
    conn.query_row(
        "SELECT id, author_id, text, likes_count, is_published, pub_date, updated_at
         FROM posts WHERE id = ?1",
        params![id],
        row_to_post,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => SlifeError::not_found("Post", id),
        _ => SlifeError::from(e),
    })
}

/// Resolve a post by ID or unique ID prefix.
pub fn resolve_post(conn: &Connection, reference: &str) -> Result<Post, SlifeError> {
    if let Ok(post) = get_post(conn, reference) {
        return Ok(post);
    }
    let mut stmt = conn.prepare(
        "SELECT id, author_id, text, likes_count, is_published, pub_date, updated_at
         FROM posts WHERE id LIKE ?1",
    )?;
    let posts: Vec<Post> = stmt
        .query_map(params![format!("{reference}%")], row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    match posts.len() {
        1 => Ok(posts.into_iter().next().unwrap()),
        _ => Err(SlifeError::not_found("Post", reference)),
    }
}

pub fn list_posts(conn: &Connection) -> Result<Vec<Post>, SlifeError> {
    let mut stmt = conn.prepare(
        "SELECT id, author_id, text, likes_count, is_published, pub_date, updated_at
         FROM posts WHERE is_published = 1 ORDER BY pub_date DESC",
    )?;
    let posts = stmt
        .query_map([], row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn create_comment(
    conn: &Connection,
    id: &str,
    post_id: &str,
    author_id: &str,
    text: &str,
) -> Result<Comment, SlifeError> {
    conn.execute(
        "INSERT INTO comments (id, post_id, author_id, text, pub_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, post_id, author_id, text, now_ts()],
    )?;
    get_comment(conn, id)
}

pub fn get_comment(conn: &Connection, id: &str) -> Result<Comment, SlifeError> {
    conn.query_row(
        "SELECT id, post_id, author_id, text, likes_count, pub_date
         FROM comments WHERE id = ?1",
        params![id],
        row_to_comment,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => SlifeError::not_found("Comment", id),
        _ => SlifeError::from(e),
    })
}

/// Resolve a comment by ID or unique ID prefix.
pub fn resolve_comment(conn: &Connection, reference: &str) -> Result<Comment, SlifeError> {
    if let Ok(comment) = get_comment(conn, reference) {
        return Ok(comment);
    }
    let mut stmt = conn.prepare(
        "SELECT id, post_id, author_id, text, likes_count, pub_date
         FROM comments WHERE id LIKE ?1",
    )?;
    let comments: Vec<Comment> = stmt
        .query_map(params![format!("{reference}%")], row_to_comment)?
        .collect::<Result<Vec<_>, _>>()?;
    match comments.len() {
        1 => Ok(comments.into_iter().next().unwrap()),
        _ => Err(SlifeError::not_found("Comment", reference)),
    }
}

pub fn list_comments(conn: &Connection, post_id: &str) -> Result<Vec<Comment>, SlifeError> {
    let mut stmt = conn.prepare(
        "SELECT id, post_id, author_id, text, likes_count, pub_date
         FROM comments WHERE post_id = ?1 ORDER BY pub_date DESC",
    )?;
    let comments = stmt
        .query_map(params![post_id], row_to_comment)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

/// Insert one like record. The UNIQUE (user, content type, content id)
/// constraint is the source of truth for "at most one like per pair".
pub fn insert_like(
    conn: &Connection,
    id: &str,
    user_id: &str,
    target: LikeTarget,
) -> Result<(), SlifeError> {
    conn.execute(
        "INSERT INTO likes (id, user_id, content_type, content_id, liked_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, user_id, target.content_type(), target.content_id(), now_ts()],
    )
    .map_err(|e| {
        let err = SlifeError::from(e);
        if err.is_unique_violation() {
            SlifeError::already_liked()
        } else {
            err
        }
    })?;
    Ok(())
}

pub fn delete_like(
    conn: &Connection,
    user_id: &str,
    target: LikeTarget,
) -> Result<bool, SlifeError> {
    let deleted = conn.execute(
        "DELETE FROM likes WHERE user_id = ?1 AND content_type = ?2 AND content_id = ?3",
        params![user_id, target.content_type(), target.content_id()],
    )?;
    Ok(deleted == 1)
}

pub fn list_likes(conn: &Connection, target: LikeTarget) -> Result<Vec<Like>, SlifeError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, content_type, content_id, liked_at FROM likes
         WHERE content_type = ?1 AND content_id = ?2 ORDER BY liked_at DESC",
    )?;
    let likes = stmt
        .query_map(params![target.content_type(), target.content_id()], |row| {
            Ok(Like {
                id: row.get(0)?,
                user_id: row.get(1)?,
                content_type: row.get(2)?,
                content_id: row.get(3)?,
                liked_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(likes)
}

/// Recompute the denormalized counter as the exact cardinality of the like
/// set. A full recount rather than an increment, so any prior drift heals on
/// the next write.
pub fn recount_likes(conn: &Connection, target: LikeTarget) -> Result<i64, SlifeError> {
    let table = match target {
        LikeTarget::Post(_) => "posts",
        LikeTarget::Comment(_) => "comments",
    };
    conn.execute(
        &format!(
            "UPDATE {table} SET likes_count =
                 (SELECT COUNT(*) FROM likes WHERE content_type = ?1 AND content_id = ?2)
             WHERE id = ?2"
        ),
        params![target.content_type(), target.content_id()],
    )?;
    let count = conn.query_row(
        &format!("SELECT likes_count FROM {table} WHERE id = ?1"),
        params![target.content_id()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        text: row.get(2)?,
        likes_count: row.get(3)?,
        is_published: row.get(4)?,
        pub_date: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_comment(row: &rusqlite::Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        text: row.get(3)?,
        likes_count: row.get(4)?,
        pub_date: row.get(5)?,
    })
}
