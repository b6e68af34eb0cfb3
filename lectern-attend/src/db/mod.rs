//! Database access for lectern-attend
//!
//! Attendance summaries are stored in the shared lectern.db in the root folder.

pub mod attendance;

use crate::error::{AttendError, Result};
use sqlx::SqlitePool;
use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};

/// Initialize database connection pool and create tables
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(lectern_common::Error::from)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create attendance tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_sessions (
            session_id TEXT PRIMARY KEY,
            ended_at TEXT NOT NULL,
            student_count INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_records (
            session_id TEXT NOT NULL,
            student_name TEXT NOT NULL,
            total_frames INTEGER NOT NULL,
            attentive_frames INTEGER NOT NULL,
            attentive_percentage INTEGER NOT NULL,
            estimated_seconds REAL NOT NULL,
            average_confidence REAL NOT NULL,
            top_distraction_reason TEXT NOT NULL,
            distraction_event_count INTEGER NOT NULL,
            attendance_status TEXT NOT NULL,
            PRIMARY KEY (session_id, student_name),
            FOREIGN KEY (session_id) REFERENCES attendance_sessions(session_id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Retry a database operation while SQLite reports "database is locked"
///
/// Backoff starts at 10ms and doubles up to 1s; gives up after `max_wait`.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait: Duration,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let mut attempt = 0u32;
    let mut backoff = Duration::from_millis(10);

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Database operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(AttendError::Database(err))
                if err.to_string().contains("database is locked")
                    && start.elapsed() + backoff < max_wait =>
            {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Database locked, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(Duration::from_secs(1));
            }
            Err(err) => return Err(err),
        }
    }
}
