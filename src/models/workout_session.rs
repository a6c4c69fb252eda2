use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{ExerciseLog, FromSqliteRow, Mood, Rpe};

/// Notes value written by `abandon_session`. Finished rows whose `status`
/// column was never updated (it still holds the `in_progress` default) are
/// recognised as abandoned by this marker alone.
pub const ABANDONED_NOTES_MARKER: &str = "[ABANDONED]";

/// Finished and abandoned, by `status` column or, on rows the column does
/// not classify, by marker. Mirrors `SessionStatus::resolve`.
pub const ABANDONED_SQL: &str = "(completed_at IS NOT NULL AND (status = 'abandoned' \
     OR (COALESCE(status, '') NOT IN ('completed', 'abandoned') \
     AND COALESCE(notes, '') = '[ABANDONED]')))";

/// Finished and not abandoned.
pub const COMPLETED_SQL: &str = "(completed_at IS NOT NULL AND NOT (COALESCE(status, '') = 'abandoned' \
     OR (COALESCE(status, '') NOT IN ('completed', 'abandoned') \
     AND COALESCE(notes, '') = '[ABANDONED]')))";

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(SessionStatus::InProgress),
            "completed" => Some(SessionStatus::Completed),
            "abandoned" => Some(SessionStatus::Abandoned),
            _ => None,
        }
    }

    /// Status implied by the completion timestamp and the abandoned marker.
    pub fn derive(completed_at: Option<&DateTime<Utc>>, notes: Option<&str>) -> Self {
        match (completed_at, notes) {
            (None, _) => SessionStatus::InProgress,
            (Some(_), Some(ABANDONED_NOTES_MARKER)) => SessionStatus::Abandoned,
            (Some(_), _) => SessionStatus::Completed,
        }
    }

    /// Resolve a stored row. `completed_at` alone decides whether the session
    /// is still in progress; the `status` column only separates completed
    /// from abandoned, and the marker covers finished rows it does not.
    pub fn resolve(
        completed_at: Option<&DateTime<Utc>>,
        column: Option<&str>,
        notes: Option<&str>,
    ) -> Self {
        if completed_at.is_none() {
            return SessionStatus::InProgress;
        }
        match column.and_then(SessionStatus::parse) {
            Some(status @ (SessionStatus::Completed | SessionStatus::Abandoned)) => status,
            _ => SessionStatus::derive(completed_at, notes),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: String,
    pub user_id: String,
    pub routine_day_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Minutes actually spent, as reported on completion.
    pub actual_duration: Option<u32>,
    pub rpe: Option<Rpe>,
    pub mood: Option<Mood>,
    pub notes: Option<String>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl WorkoutSession {
    pub fn is_active(&self) -> bool {
        self.completed_at.is_none()
    }

    pub fn is_abandoned(&self) -> bool {
        self.status == SessionStatus::Abandoned
    }
}

impl FromSqliteRow for WorkoutSession {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let completed_at: Option<DateTime<Utc>> = row.get("completed_at")?;
        let notes: Option<String> = row.get("notes")?;
        let status: Option<String> = row.get("status")?;
        let mood: Option<String> = row.get("mood")?;

        let status =
            SessionStatus::resolve(completed_at.as_ref(), status.as_deref(), notes.as_deref());

        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            routine_day_id: row.get("routine_day_id")?,
            started_at: row.get("started_at")?,
            completed_at,
            actual_duration: row.get("actual_duration")?,
            rpe: row.get("rpe")?,
            mood: mood.as_deref().and_then(Mood::parse),
            notes,
            status,
            created_at: row.get("created_at")?,
        })
    }
}

/// Optional details supplied when finishing a session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompletionData {
    pub rpe: Option<Rpe>,
    pub mood: Option<Mood>,
    pub notes: Option<String>,
    pub actual_duration: Option<u32>,
}

/// Status filter for session listings. `Completed` matches every finished
/// session, including abandoned ones; `Abandoned` narrows to those only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatusFilter {
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatusFilter {
    pub fn sql_predicate(&self) -> &'static str {
        match self {
            SessionStatusFilter::InProgress => "completed_at IS NULL",
            SessionStatusFilter::Completed => "completed_at IS NOT NULL",
            SessionStatusFilter::Abandoned => ABANDONED_SQL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionQuery {
    pub status: Option<SessionStatusFilter>,
    /// Inclusive lower bound on `started_at`.
    pub from_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `started_at`.
    pub to_date: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for SessionQuery {
    fn default() -> Self {
        Self {
            status: None,
            from_date: None,
            to_date: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSessionWithLogs {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub logs: Vec<ExerciseLog>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub routine_day_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub total_sets: usize,
    pub total_exercises: usize,
    pub average_rpe: Option<f64>,
    pub mood: Option<Mood>,
}

impl SessionSummary {
    pub fn from_logs(session: &WorkoutSession, logs: &[&ExerciseLog]) -> Self {
        let mut exercises: Vec<&str> = logs.iter().map(|l| l.exercise_id.as_str()).collect();
        exercises.sort_unstable();
        exercises.dedup();

        let rpes: Vec<f64> = logs
            .iter()
            .filter_map(|l| l.rpe)
            .map(|r| f64::from(r.value()))
            .collect();
        let average_rpe = if rpes.is_empty() {
            None
        } else {
            let mean = rpes.iter().sum::<f64>() / rpes.len() as f64;
            Some((mean * 10.0).round() / 10.0)
        };

        Self {
            session_id: session.id.clone(),
            routine_day_id: session.routine_day_id.clone(),
            started_at: session.started_at,
            completed_at: session.completed_at,
            status: session.status,
            total_sets: logs.len(),
            total_exercises: exercises.len(),
            average_rpe,
            mood: session.mood,
        }
    }
}
