//! Workout session persistence port.
//!
//! Handlers depend on this trait; [`super::SqliteSessionRepository`] is the
//! production adapter, built per request by [`super::create_session_repository`].
//!
//! Absent rows are `Ok(None)`, never an error. Reads by id are not scoped to
//! the caller: handlers must compare the returned `user_id` with the
//! authenticated user before exposing data.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    CompletionData, ExerciseLog, ExerciseLogUpdate, NewExerciseLog, ProgressStats, SessionQuery,
    SessionSummary, WorkoutSession, WorkoutSessionWithLogs,
};

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Begin a session on a routine day from one of the user's plans.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` when no caller identity is attached
    /// - `Forbidden` when the caller is not `user_id` or does not own the routine day
    /// - `NotFound` when the routine day does not exist
    /// - `Conflict` when the user already has an unfinished session
    async fn start_session(&self, user_id: &str, routine_day_id: &str) -> Result<String>;

    /// Mark a session finished. A session that is already finished is left
    /// untouched and the call still succeeds.
    async fn complete_session(&self, session_id: &str, data: CompletionData) -> Result<()>;

    /// Mark a session abandoned. Same guard as [`Self::complete_session`].
    async fn abandon_session(&self, session_id: &str) -> Result<()>;

    /// Record one set.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the session or exercise does not exist
    /// - `Conflict` when the session is already finished
    async fn log_exercise_set(&self, session_id: &str, data: NewExerciseLog) -> Result<String>;

    /// Apply a partial correction to a logged set.
    async fn update_exercise_log(&self, log_id: &str, update: ExerciseLogUpdate) -> Result<()>;

    async fn delete_exercise_log(&self, log_id: &str) -> Result<()>;

    async fn get_session_by_id(&self, id: &str) -> Result<Option<WorkoutSession>>;

    async fn get_session_with_logs(&self, id: &str) -> Result<Option<WorkoutSessionWithLogs>>;

    /// Sessions for a user, newest start first.
    async fn get_sessions_by_user(
        &self,
        user_id: &str,
        query: &SessionQuery,
    ) -> Result<Vec<WorkoutSession>>;

    /// Logs for a session in the order they were recorded.
    async fn get_exercise_logs(&self, session_id: &str) -> Result<Vec<ExerciseLog>>;

    async fn get_exercise_log_by_id(&self, log_id: &str) -> Result<Option<ExerciseLog>>;

    /// The `limit` most recent sessions with per-session aggregates.
    async fn get_session_summaries(&self, user_id: &str, limit: i64)
        -> Result<Vec<SessionSummary>>;

    /// The user's unfinished session, if any.
    async fn get_active_session(&self, user_id: &str) -> Result<Option<WorkoutSession>>;

    async fn get_progress_stats(&self, user_id: &str) -> Result<ProgressStats>;
}
