//! Database layer for SQLite storage.
//!
//! This module handles:
//! - Connection pool management with WAL mode
//! - Schema migrations
//! - The SQLite implementation of every storage gateway ([`SqliteStore`])

pub mod pool;
mod pull_requests;
mod stats;
mod teams;
mod users;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::AppError;

/// Name recorded in `_migrations` for the embedded schema.
const INITIAL_MIGRATION: &str = "0001_initial_schema";

/// Database-related errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Default location of the database file under a data directory.
pub fn get_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("pr-reviewer.db")
}

/// Initialize the database: create the file if needed and run migrations.
pub async fn initialize(db_path: &Path) -> Result<pool::DbPool, DbError> {
    initialize_with(db_path, pool::DEFAULT_MAX_CONNECTIONS).await
}

/// Like [`initialize`], with an explicit pool size.
pub async fn initialize_with(
    db_path: &Path,
    max_connections: u32,
) -> Result<pool::DbPool, DbError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            DbError::Migration(format!("Failed to create database directory: {}", e))
        })?;
    }

    let pool = pool::create_pool(db_path, max_connections).await?;
    run_migrations(&pool).await?;

    log::info!("[db] Database ready at {}", db_path.display());
    Ok(pool)
}

/// Run all pending database migrations.
async fn run_migrations(pool: &pool::DbPool) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    let applied: Option<(i64,)> = sqlx::query_as("SELECT id FROM _migrations WHERE name = ?")
        .bind(INITIAL_MIGRATION)
        .fetch_optional(&mut *conn)
        .await?;

    if applied.is_none() {
        let migration_sql = include_str!("migrations/0001_initial_schema.sql");

        for statement in parse_sql_statements(migration_sql) {
            sqlx::query(&statement).execute(&mut *conn).await?;
        }

        sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
            .bind(INITIAL_MIGRATION)
            .execute(&mut *conn)
            .await?;

        log::info!("[db] Applied migration {}", INITIAL_MIGRATION);
    }

    Ok(())
}

/// Split a migration file into statements.
///
/// Comments are dropped; semicolons nested in parentheses (e.g. inside a
/// CHECK or DEFAULT expression) do not end a statement.
fn parse_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;

    for line in sql.lines() {
        let code = match line.find("--") {
            Some(idx) => &line[..idx],
            None => line,
        };
        if code.trim().is_empty() {
            continue;
        }

        for ch in code.chars() {
            match ch {
                '(' => {
                    depth += 1;
                    current.push(ch);
                }
                ')' => {
                    depth = (depth - 1).max(0);
                    current.push(ch);
                }
                ';' if depth == 0 => {
                    let stmt = current.trim();
                    if !stmt.is_empty() {
                        statements.push(stmt.to_string());
                    }
                    current.clear();
                }
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            current.push(' ');
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

/// Map a constraint violation to a domain error, anything else to a
/// database error tagged with `operation`.
fn map_constraint(
    err: sqlx::Error,
    operation: &str,
    on_unique: impl FnOnce() -> AppError,
    on_foreign_key: impl FnOnce() -> AppError,
) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
        if db_err.is_foreign_key_violation() {
            return on_foreign_key();
        }
    }
    AppError::database_with_op(err.to_string(), operation)
}

/// Storage gateways backed by SQLite.
///
/// Implements [`TeamStore`](crate::store::TeamStore),
/// [`UserStore`](crate::store::UserStore), [`PrStore`](crate::store::PrStore)
/// and [`StatsStore`](crate::store::StatsStore).
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: pool::DbPool,
}

impl SqliteStore {
    pub fn new(pool: pool::DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &pool::DbPool {
        &self.pool
    }
}
