pub mod exercise_log;
pub mod from_row;
pub mod mood;
pub mod plan;
pub mod rpe;
pub mod stats;
pub mod workout_session;

pub use exercise_log::{ExerciseLog, ExerciseLogUpdate, NewExerciseLog};
pub use from_row::FromSqliteRow;
pub use mood::Mood;
pub use plan::{
    ImportedExercise, ImportedPlan, ImportedRoutineDay, PlanDay, PlanWeek, PlannedExercise,
    WorkoutPlan,
};
pub use rpe::{InvalidRpe, Rpe};
pub use stats::ProgressStats;
pub use workout_session::{
    CompletionData, SessionQuery, SessionStatus, SessionStatusFilter, SessionSummary,
    WorkoutSession, WorkoutSessionWithLogs, ABANDONED_NOTES_MARKER, ABANDONED_SQL, COMPLETED_SQL,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
