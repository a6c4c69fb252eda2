use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rusqlite::types::ToSql;
use rusqlite::{Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use super::SessionRepository;
use crate::db::{DbConnection, DbPool};
use crate::error::{AppError, Result};
use crate::models::{
    CompletionData, ExerciseLog, ExerciseLogUpdate, FromSqliteRow, NewExerciseLog, ProgressStats,
    SessionQuery, SessionSummary, WorkoutSession, WorkoutSessionWithLogs, ABANDONED_NOTES_MARKER,
    ABANDONED_SQL, COMPLETED_SQL,
};

/// SQLite adapter for [`SessionRepository`].
///
/// `current_user` is the identity vouched for by the identity provider for
/// the request this repository was built for.
#[derive(Clone)]
pub struct SqliteSessionRepository {
    pool: DbPool,
    current_user: Option<String>,
}

impl SqliteSessionRepository {
    pub fn new(pool: DbPool, current_user: Option<String>) -> Self {
        Self { pool, current_user }
    }

    /// Run `f` on a pooled connection off the async runtime. The closure runs
    /// to completion even if the awaiting request is dropped.
    async fn run<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&mut DbConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<T> {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| AppError::Internal(format!("{operation}: {e}")))?
        .map_err(|e| e.in_operation(operation))
    }
}

fn is_constraint_violation(err: &rusqlite::Error, extended_code: i32) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation && e.extended_code == extended_code
    )
}

fn active_session_conflict() -> AppError {
    AppError::Conflict("User already has an active session".to_string())
}

fn find_session(conn: &Connection, id: &str) -> rusqlite::Result<Option<WorkoutSession>> {
    conn.query_row(
        "SELECT * FROM workout_sessions WHERE id = ?",
        [id],
        WorkoutSession::from_row,
    )
    .optional()
}

fn find_logs(conn: &Connection, session_id: &str) -> rusqlite::Result<Vec<ExerciseLog>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM exercise_logs WHERE session_id = ? ORDER BY created_at ASC, rowid ASC",
    )?;
    let logs = stmt
        .query_map([session_id], ExerciseLog::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(logs)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn start_session(&self, user_id: &str, routine_day_id: &str) -> Result<String> {
        let caller = self.current_user.as_deref().ok_or(AppError::Unauthorized)?;
        if caller != user_id {
            return Err(AppError::Forbidden(
                "Cannot start a session for another user".to_string(),
            ));
        }

        let user_id = user_id.to_string();
        let routine_day_id = routine_day_id.to_string();

        self.run("start_session", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let owner: Option<String> = tx
                .query_row(
                    "SELECT wp.user_id FROM routine_days rd
                     JOIN workout_plans wp ON rd.plan_id = wp.id
                     WHERE rd.id = ?",
                    [&routine_day_id],
                    |row| row.get(0),
                )
                .optional()?;

            match owner {
                None => return Err(AppError::NotFound("Routine day not found".to_string())),
                Some(owner) if owner != user_id => {
                    return Err(AppError::Forbidden(
                        "Routine day belongs to another user".to_string(),
                    ))
                }
                Some(_) => {}
            }

            let active: Option<String> = tx
                .query_row(
                    "SELECT id FROM workout_sessions
                     WHERE user_id = ? AND completed_at IS NULL LIMIT 1",
                    [&user_id],
                    |row| row.get(0),
                )
                .optional()?;
            if active.is_some() {
                return Err(active_session_conflict());
            }

            let id = Uuid::new_v4().to_string();
            let now = Utc::now();
            // The partial unique index backs up the check above
            tx.execute(
                "INSERT INTO workout_sessions (id, user_id, routine_day_id, started_at, status, created_at)
                 VALUES (?, ?, ?, ?, 'in_progress', ?)",
                rusqlite::params![id, user_id, routine_day_id, now, now],
            )
            .map_err(|e| {
                if is_constraint_violation(&e, rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE) {
                    active_session_conflict()
                } else {
                    AppError::from(e)
                }
            })?;

            tx.commit()?;
            Ok(id)
        })
        .await
    }

    async fn complete_session(&self, session_id: &str, data: CompletionData) -> Result<()> {
        let session_id = session_id.to_string();
        let now = Utc::now();

        self.run("complete_session", move |conn| {
            conn.execute(
                "UPDATE workout_sessions
                 SET completed_at = ?, status = 'completed', rpe = ?, mood = ?, notes = ?, actual_duration = ?
                 WHERE id = ? AND completed_at IS NULL",
                rusqlite::params![
                    now,
                    data.rpe,
                    data.mood.map(|m| m.as_str()),
                    data.notes,
                    data.actual_duration,
                    session_id
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn abandon_session(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.to_string();
        let now = Utc::now();

        self.run("abandon_session", move |conn| {
            conn.execute(
                "UPDATE workout_sessions
                 SET completed_at = ?, status = 'abandoned', notes = ?
                 WHERE id = ? AND completed_at IS NULL",
                rusqlite::params![now, ABANDONED_NOTES_MARKER, session_id],
            )?;
            Ok(())
        })
        .await
    }

    async fn log_exercise_set(&self, session_id: &str, data: NewExerciseLog) -> Result<String> {
        let session_id = session_id.to_string();

        self.run("log_exercise_set", move |conn| {
            let completed_at: Option<Option<chrono::DateTime<Utc>>> = conn
                .query_row(
                    "SELECT completed_at FROM workout_sessions WHERE id = ?",
                    [&session_id],
                    |row| row.get(0),
                )
                .optional()?;

            match completed_at {
                None => return Err(AppError::NotFound("Session not found".to_string())),
                Some(Some(_)) => {
                    return Err(AppError::Conflict(
                        "Cannot log exercises to a completed session".to_string(),
                    ))
                }
                Some(None) => {}
            }

            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO exercise_logs
                    (id, session_id, exercise_id, set_number, weight, reps, rpe, notes, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    id,
                    session_id,
                    data.exercise_id,
                    data.set_number,
                    data.weight,
                    data.reps,
                    data.rpe,
                    data.notes,
                    Utc::now()
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e, rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY) {
                    AppError::NotFound("Exercise not found".to_string())
                } else {
                    AppError::from(e)
                }
            })?;

            Ok(id)
        })
        .await
    }

    // Corrections stay possible after the session is finished, and ownership
    // is left to the caller. Whether finished sessions should reject edits is
    // still undecided; tighten here if that changes.
    async fn update_exercise_log(&self, log_id: &str, update: ExerciseLogUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let log_id = log_id.to_string();

        self.run("update_exercise_log", move |conn| {
            let mut assignments: Vec<&str> = Vec::new();
            let mut values: Vec<&dyn ToSql> = Vec::new();

            if let Some(weight) = &update.weight {
                assignments.push("weight = ?");
                values.push(weight);
            }
            if let Some(reps) = &update.reps {
                assignments.push("reps = ?");
                values.push(reps);
            }
            if let Some(rpe) = &update.rpe {
                assignments.push("rpe = ?");
                values.push(rpe);
            }
            if let Some(notes) = &update.notes {
                assignments.push("notes = ?");
                values.push(notes);
            }
            values.push(&log_id);

            let sql = format!(
                "UPDATE exercise_logs SET {} WHERE id = ?",
                assignments.join(", ")
            );
            conn.execute(&sql, values.as_slice())?;
            Ok(())
        })
        .await
    }

    async fn delete_exercise_log(&self, log_id: &str) -> Result<()> {
        let log_id = log_id.to_string();

        self.run("delete_exercise_log", move |conn| {
            conn.execute("DELETE FROM exercise_logs WHERE id = ?", [&log_id])?;
            Ok(())
        })
        .await
    }

    async fn get_session_by_id(&self, id: &str) -> Result<Option<WorkoutSession>> {
        let id = id.to_string();
        self.run("get_session_by_id", move |conn| Ok(find_session(conn, &id)?))
            .await
    }

    async fn get_session_with_logs(&self, id: &str) -> Result<Option<WorkoutSessionWithLogs>> {
        let id = id.to_string();

        self.run("get_session_with_logs", move |conn| {
            let Some(session) = find_session(conn, &id)? else {
                return Ok(None);
            };
            let logs = find_logs(conn, &id)?;
            Ok(Some(WorkoutSessionWithLogs { session, logs }))
        })
        .await
    }

    async fn get_sessions_by_user(
        &self,
        user_id: &str,
        query: &SessionQuery,
    ) -> Result<Vec<WorkoutSession>> {
        let user_id = user_id.to_string();
        let query = query.clone();

        self.run("get_sessions_by_user", move |conn| {
            let mut sql = String::from("SELECT * FROM workout_sessions WHERE user_id = ?");
            let mut values: Vec<&dyn ToSql> = Vec::new();
            values.push(&user_id);

            if let Some(status) = &query.status {
                sql.push_str(" AND ");
                sql.push_str(status.sql_predicate());
            }
            if let Some(from_date) = &query.from_date {
                sql.push_str(" AND started_at >= ?");
                values.push(from_date);
            }
            if let Some(to_date) = &query.to_date {
                sql.push_str(" AND started_at <= ?");
                values.push(to_date);
            }
            sql.push_str(" ORDER BY started_at DESC, rowid DESC LIMIT ? OFFSET ?");
            values.push(&query.limit);
            values.push(&query.offset);

            let mut stmt = conn.prepare(&sql)?;
            let sessions = stmt
                .query_map(values.as_slice(), WorkoutSession::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sessions)
        })
        .await
    }

    async fn get_exercise_logs(&self, session_id: &str) -> Result<Vec<ExerciseLog>> {
        let session_id = session_id.to_string();
        self.run("get_exercise_logs", move |conn| Ok(find_logs(conn, &session_id)?))
            .await
    }

    async fn get_exercise_log_by_id(&self, log_id: &str) -> Result<Option<ExerciseLog>> {
        let log_id = log_id.to_string();

        self.run("get_exercise_log_by_id", move |conn| {
            let log = conn
                .query_row(
                    "SELECT * FROM exercise_logs WHERE id = ?",
                    [&log_id],
                    ExerciseLog::from_row,
                )
                .optional()?;
            Ok(log)
        })
        .await
    }

    async fn get_session_summaries(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<SessionSummary>> {
        let user_id = user_id.to_string();

        self.run("get_session_summaries", move |conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM workout_sessions WHERE user_id = ?
                 ORDER BY started_at DESC, rowid DESC LIMIT ?",
            )?;
            let sessions = stmt
                .query_map(rusqlite::params![user_id, limit], WorkoutSession::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            if sessions.is_empty() {
                return Ok(Vec::new());
            }

            let placeholders = vec!["?"; sessions.len()].join(", ");
            let sql = format!(
                "SELECT * FROM exercise_logs WHERE session_id IN ({placeholders})
                 ORDER BY created_at ASC, rowid ASC"
            );
            let ids: Vec<&dyn ToSql> = sessions.iter().map(|s| &s.id as &dyn ToSql).collect();
            let mut stmt = conn.prepare(&sql)?;
            let logs = stmt
                .query_map(ids.as_slice(), ExerciseLog::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut by_session: HashMap<&str, Vec<&ExerciseLog>> = HashMap::new();
            for log in &logs {
                by_session.entry(log.session_id.as_str()).or_default().push(log);
            }

            let summaries = sessions
                .iter()
                .map(|session| {
                    let session_logs = by_session
                        .get(session.id.as_str())
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    SessionSummary::from_logs(session, session_logs)
                })
                .collect();
            Ok(summaries)
        })
        .await
    }

    async fn get_active_session(&self, user_id: &str) -> Result<Option<WorkoutSession>> {
        let user_id = user_id.to_string();

        self.run("get_active_session", move |conn| {
            let session = conn
                .query_row(
                    "SELECT * FROM workout_sessions
                     WHERE user_id = ? AND completed_at IS NULL
                     ORDER BY started_at DESC, rowid DESC LIMIT 1",
                    [&user_id],
                    WorkoutSession::from_row,
                )
                .optional()?;
            Ok(session)
        })
        .await
    }

    async fn get_progress_stats(&self, user_id: &str) -> Result<ProgressStats> {
        let user_id = user_id.to_string();
        let window_start = Utc::now() - Duration::days(7);

        self.run("get_progress_stats", move |conn| {
            let sql = format!(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN {COMPLETED_SQL} THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN {ABANDONED_SQL} THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN started_at >= ? THEN 1 ELSE 0 END), 0)
                 FROM workout_sessions WHERE user_id = ?"
            );
            let (total_sessions, completed_sessions, abandoned_sessions, sessions_last_7_days): (
                i64,
                i64,
                i64,
                i64,
            ) = conn.query_row(
                &sql,
                rusqlite::params![window_start, user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

            let (total_sets, total_volume, average_rpe): (i64, f64, Option<f64>) = conn
                .query_row(
                    "SELECT COUNT(el.id), COALESCE(SUM(el.weight * el.reps), 0.0), AVG(el.rpe)
                     FROM exercise_logs el
                     JOIN workout_sessions ws ON el.session_id = ws.id
                     WHERE ws.user_id = ?",
                    [&user_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )?;

            Ok(ProgressStats {
                total_sessions,
                completed_sessions,
                abandoned_sessions,
                sessions_last_7_days,
                total_sets,
                total_volume,
                average_rpe: average_rpe.map(round_tenth),
            })
        })
        .await
    }
}
