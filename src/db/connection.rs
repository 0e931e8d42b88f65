use std::env;
use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;

use crate::error::SlifeError;

use super::migrations;

/// Path to the slife database: `$SLIFE_DB` if set, otherwise
/// `./.slife/slife.db` relative to the working directory.
pub fn db_path() -> PathBuf {
    if let Ok(p) = env::var("SLIFE_DB") {
        return PathBuf::from(p);
    }
    PathBuf::from(".slife").join("slife.db")
}

/// Open a connection to the database. Returns error if not initialized.
pub fn open_db() -> Result<Connection, SlifeError> {
    let path = db_path();
    if !path.exists() {
        return Err(SlifeError::not_initialized());
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Initialize the database: create directories, database, and run migrations.
pub fn init_db() -> Result<PathBuf, SlifeError> {
    let path = db_path();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SlifeError::database(e.to_string()))?;
        }
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(path)
}

fn configure_connection(conn: &Connection) -> Result<(), SlifeError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// In-memory database with the full schema, for tests.
#[cfg(test)]
pub fn open_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch("PRAGMA foreign_keys=ON;").expect("pragma");
    migrations::run_migrations(&conn).expect("migrations");
    conn
}

/// File-backed database with the full schema, for tests that need several
/// connections to the same store. Migrations are idempotent, so every
/// connection may call this.
#[cfg(test)]
pub fn open_test_db_at(path: &std::path::Path) -> Connection {
    let conn = Connection::open(path).expect("open file db");
    configure_connection(&conn).expect("pragmas");
    migrations::run_migrations(&conn).expect("migrations");
    conn
}
