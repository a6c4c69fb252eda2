use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{FromSqliteRow, Rpe};

/// One performed set within a workout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    pub id: String,
    pub session_id: String,
    pub exercise_id: String,
    pub set_number: i32,
    /// Kilograms.
    pub weight: Option<f64>,
    pub reps: Option<i32>,
    pub rpe: Option<Rpe>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for ExerciseLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            exercise_id: row.get("exercise_id")?,
            set_number: row.get("set_number")?,
            weight: row.get("weight")?,
            reps: row.get("reps")?,
            rpe: row.get("rpe")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// A set to record. `set_number` is assigned by the caller and is not
/// deduplicated against existing logs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewExerciseLog {
    pub exercise_id: String,
    pub set_number: i32,
    pub weight: Option<f64>,
    pub reps: Option<i32>,
    pub rpe: Option<Rpe>,
    pub notes: Option<String>,
}

/// Partial correction of a logged set. `None` leaves the stored value as is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExerciseLogUpdate {
    pub weight: Option<f64>,
    pub reps: Option<i32>,
    pub rpe: Option<Rpe>,
    pub notes: Option<String>,
}

impl ExerciseLogUpdate {
    pub fn is_empty(&self) -> bool {
        self.weight.is_none() && self.reps.is_none() && self.rpe.is_none() && self.notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_is_empty() {
        assert!(ExerciseLogUpdate::default().is_empty());

        let update = ExerciseLogUpdate {
            weight: Some(52.5),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_new_log_from_json() {
        let log: NewExerciseLog = serde_json::from_str(
            r#"{"exerciseId": "e1", "setNumber": 2, "weight": 80, "reps": 9, "rpe": 8}"#,
        )
        .unwrap();
        assert_eq!(log.exercise_id, "e1");
        assert_eq!(log.set_number, 2);
        assert_eq!(log.weight, Some(80.0));
        assert_eq!(log.reps, Some(9));
        assert_eq!(log.rpe.map(Rpe::value), Some(8));
        assert!(log.notes.is_none());
    }

    #[test]
    fn test_new_log_requires_set_number() {
        let result = serde_json::from_str::<NewExerciseLog>(r#"{"exerciseId": "e1"}"#);
        assert!(result.is_err());
    }
}
