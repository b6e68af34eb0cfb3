//! Attendance summary persistence
//!
//! Each ended session is stored as one `attendance_sessions` row plus one
//! `attendance_records` row per student. Ending a session id again replaces
//! its previous records.

use super::retry_on_lock;
use crate::error::{AttendError, Result};
use chrono::{DateTime, Utc};
use lectern_common::{AttendanceStatus, SessionSummaryEntry};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::time::Duration;

const MAX_LOCK_WAIT: Duration = Duration::from_secs(5);

/// A persisted session summary
#[derive(Debug, Clone, Serialize)]
pub struct StoredSummary {
    pub session_id: String,
    pub ended_at: DateTime<Utc>,
    pub summary: Vec<SessionSummaryEntry>,
}

/// Save (or replace) the summary of an ended session
pub async fn save_summary(
    pool: &SqlitePool,
    session_id: &str,
    ended_at: DateTime<Utc>,
    summary: &[SessionSummaryEntry],
) -> Result<()> {
    let ended_at = ended_at.to_rfc3339();
    let student_count = summary.len() as i64;

    retry_on_lock("save_summary", MAX_LOCK_WAIT, || async {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO attendance_sessions (session_id, ended_at, student_count)
            VALUES (?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                ended_at = excluded.ended_at,
                student_count = excluded.student_count
            "#,
        )
        .bind(session_id)
        .bind(&ended_at)
        .bind(student_count)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM attendance_records WHERE session_id = ?")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        for entry in summary {
            sqlx::query(
                r#"
                INSERT INTO attendance_records (
                    session_id, student_name, total_frames, attentive_frames,
                    attentive_percentage, estimated_seconds, average_confidence,
                    top_distraction_reason, distraction_event_count, attendance_status
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(session_id)
            .bind(&entry.name)
            .bind(entry.total_frames as i64)
            .bind(entry.attentive_frames as i64)
            .bind(entry.attentive_percentage as i64)
            .bind(entry.estimated_seconds)
            .bind(entry.average_confidence)
            .bind(&entry.top_distraction_reason)
            .bind(entry.distraction_event_count as i64)
            .bind(entry.attendance_status.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok::<(), AttendError>(())
    })
    .await?;

    tracing::debug!(session_id = %session_id, students = summary.len(), "Attendance summary saved");
    Ok(())
}

/// Load the persisted summary of a session, if it was ever ended
pub async fn load_summary(pool: &SqlitePool, session_id: &str) -> Result<Option<StoredSummary>> {
    let session_row = sqlx::query("SELECT ended_at FROM attendance_sessions WHERE session_id = ?")
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

    let Some(session_row) = session_row else {
        return Ok(None);
    };

    let ended_at: String = session_row.get("ended_at");
    let ended_at = DateTime::parse_from_rfc3339(&ended_at)
        .map_err(|e| AttendError::CorruptRecord(format!("ended_at: {}", e)))?
        .with_timezone(&Utc);

    let rows = sqlx::query(
        r#"
        SELECT student_name, total_frames, attentive_frames, attentive_percentage,
               estimated_seconds, average_confidence, top_distraction_reason,
               distraction_event_count, attendance_status
        FROM attendance_records
        WHERE session_id = ?
        ORDER BY student_name
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    let mut summary = Vec::with_capacity(rows.len());
    for row in rows {
        let status: String = row.get("attendance_status");
        let attendance_status: AttendanceStatus = status.parse().map_err(AttendError::CorruptRecord)?;

        summary.push(SessionSummaryEntry {
            name: row.get("student_name"),
            total_frames: row.get::<i64, _>("total_frames") as u64,
            attentive_frames: row.get::<i64, _>("attentive_frames") as u64,
            attentive_percentage: row.get::<i64, _>("attentive_percentage") as u32,
            estimated_seconds: row.get("estimated_seconds"),
            average_confidence: row.get("average_confidence"),
            top_distraction_reason: row.get("top_distraction_reason"),
            distraction_event_count: row.get::<i64, _>("distraction_event_count") as u64,
            attendance_status,
        });
    }

    Ok(Some(StoredSummary {
        session_id: session_id.to_string(),
        ended_at,
        summary,
    }))
}
