use rusqlite::Connection;

use crate::error::SlifeError;

pub fn run_migrations(conn: &Connection) -> Result<(), SlifeError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS skills (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS user_skills (
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            skill_id TEXT NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
            level INTEGER NOT NULL DEFAULT 1,
            experience INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, skill_id)
        );

        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS catalog_tasks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            short_description TEXT NOT NULL,
            hint TEXT,
            difficulty TEXT NOT NULL
                CHECK (difficulty IN ('easy', 'medium', 'hard'))
        );

        CREATE TABLE IF NOT EXISTS task_categories (
            task_id TEXT NOT NULL REFERENCES catalog_tasks(id) ON DELETE CASCADE,
            category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            PRIMARY KEY (task_id, category_id)
        );

        CREATE TABLE IF NOT EXISTS task_rewards (
            id TEXT PRIMARY KEY,
            task_id TEXT NOT NULL REFERENCES catalog_tasks(id) ON DELETE CASCADE,
            skill_id TEXT NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
            quantity INTEGER NOT NULL,
            is_additional INTEGER NOT NULL DEFAULT 0,
            description TEXT
        );

        CREATE TABLE IF NOT EXISTS users_tasks (
            id TEXT PRIMARY KEY,
            task_id TEXT NOT NULL REFERENCES catalog_tasks(id) ON DELETE CASCADE,
            initiator_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            target_user_id TEXT REFERENCES users(id) ON DELETE SET NULL,
            target_user_name TEXT,
            status TEXT NOT NULL DEFAULT 'started'
                CHECK (status IN ('started', 'completed', 'confirmed', 'canceled')),
            invitation_token TEXT NOT NULL UNIQUE,
            rating INTEGER CHECK (rating BETWEEN 1 AND 5),
            started_at TEXT NOT NULL DEFAULT (datetime('now')),
            completed_at TEXT,
            confirmed_at TEXT
        );

        -- Closes the check-then-insert race: one non-canceled instance of a
        -- catalog task per initiator, enforced by the storage layer.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_tasks_active
            ON users_tasks(task_id, initiator_id)
            WHERE status != 'canceled';

        CREATE INDEX IF NOT EXISTS idx_users_tasks_initiator
            ON users_tasks(initiator_id, status);

        CREATE TABLE IF NOT EXISTS subscriptions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            subscribing_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (user_id, subscribing_id),
            CHECK (user_id != subscribing_id)
        );

        CREATE TABLE IF NOT EXISTS device_tokens (
            id TEXT PRIMARY KEY,
            token TEXT NOT NULL UNIQUE,
            platform TEXT NOT NULL,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            last_used_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            author_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            text TEXT NOT NULL,
            likes_count INTEGER NOT NULL DEFAULT 0,
            is_published INTEGER NOT NULL DEFAULT 1,
            pub_date TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            author_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            text TEXT NOT NULL,
            likes_count INTEGER NOT NULL DEFAULT 0,
            pub_date TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS likes (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content_type TEXT NOT NULL CHECK (content_type IN ('post', 'comment')),
            content_id TEXT NOT NULL,
            liked_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (user_id, content_type, content_id)
        );

        CREATE INDEX IF NOT EXISTS idx_likes_content ON likes(content_type, content_id);
        CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);
        ",
    )?;
    Ok(())
}
