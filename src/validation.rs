//! Request validation applied before anything reaches a repository.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    CompletionData, ExerciseLogUpdate, NewExerciseLog, WorkoutPlan, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};

pub const MAX_WEIGHT_KG: f64 = 1000.0;
pub const MAX_REPS: i32 = 1000;
pub const MAX_LOG_NOTES_CHARS: usize = 200;
pub const MAX_SESSION_NOTES_CHARS: usize = 500;
pub const MAX_DURATION_MINUTES: u32 = 300;
pub const MAX_PLAN_NAME_CHARS: usize = 200;

/// Parse an identifier and return it in canonical hyphenated lowercase form.
pub fn parse_uuid(value: &str, field: &str) -> Result<String> {
    Uuid::parse_str(value)
        .map(|id| id.to_string())
        .map_err(|_| AppError::BadRequest(format!("{field} must be a valid UUID")))
}

fn validate_weight(weight: Option<f64>) -> Result<()> {
    match weight {
        Some(w) if !(0.0..=MAX_WEIGHT_KG).contains(&w) => Err(AppError::Validation(format!(
            "weight must be between 0 and {MAX_WEIGHT_KG} kg"
        ))),
        _ => Ok(()),
    }
}

fn validate_reps(reps: Option<i32>) -> Result<()> {
    match reps {
        Some(r) if !(1..=MAX_REPS).contains(&r) => Err(AppError::Validation(format!(
            "reps must be between 1 and {MAX_REPS}"
        ))),
        _ => Ok(()),
    }
}

fn validate_notes(notes: Option<&str>, max_chars: usize) -> Result<()> {
    match notes {
        Some(n) if n.chars().count() > max_chars => Err(AppError::Validation(format!(
            "notes must be at most {max_chars} characters"
        ))),
        _ => Ok(()),
    }
}

pub fn validate_completion(data: &CompletionData) -> Result<()> {
    validate_notes(data.notes.as_deref(), MAX_SESSION_NOTES_CHARS)?;
    match data.actual_duration {
        Some(d) if !(1..=MAX_DURATION_MINUTES).contains(&d) => Err(AppError::Validation(format!(
            "actualDuration must be between 1 and {MAX_DURATION_MINUTES} minutes"
        ))),
        _ => Ok(()),
    }
}

/// Check a new set and canonicalise its exercise id.
pub fn validate_new_log(mut data: NewExerciseLog) -> Result<NewExerciseLog> {
    data.exercise_id = parse_uuid(&data.exercise_id, "exerciseId")?;
    if data.set_number < 1 {
        return Err(AppError::Validation(
            "setNumber must be a positive integer".to_string(),
        ));
    }
    validate_weight(data.weight)?;
    validate_reps(data.reps)?;
    validate_notes(data.notes.as_deref(), MAX_LOG_NOTES_CHARS)?;
    Ok(data)
}

pub fn validate_log_update(update: &ExerciseLogUpdate) -> Result<()> {
    if update.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }
    validate_weight(update.weight)?;
    validate_reps(update.reps)?;
    validate_notes(update.notes.as_deref(), MAX_LOG_NOTES_CHARS)
}

pub fn page_limit(limit: Option<i64>) -> Result<i64> {
    match limit {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(l) if (1..=MAX_PAGE_SIZE).contains(&l) => Ok(l),
        Some(_) => Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        ))),
    }
}

pub fn page_offset(offset: Option<i64>) -> Result<i64> {
    match offset {
        None => Ok(0),
        Some(o) if o >= 0 => Ok(o),
        Some(_) => Err(AppError::Validation(
            "offset must not be negative".to_string(),
        )),
    }
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates. A plain date is
/// widened to the start of the day, or its last instant when `end_of_day`.
pub fn parse_date_bound(value: &str, field: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        AppError::BadRequest(format!("{field} must be a date (YYYY-MM-DD) or RFC 3339 timestamp"))
    })?;
    let time = if end_of_day {
        NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| AppError::Internal("invalid time of day".to_string()))?;

    Ok(date.and_time(time).and_utc())
}

pub fn validate_plan(plan: &WorkoutPlan) -> Result<()> {
    let name = plan.name.trim();
    if name.is_empty() || name.chars().count() > MAX_PLAN_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "plan name must be between 1 and {MAX_PLAN_NAME_CHARS} characters"
        )));
    }
    if plan.day_count() == 0 {
        return Err(AppError::Validation(
            "plan must contain at least one routine day".to_string(),
        ));
    }

    for week in &plan.weeks {
        for day in &week.days {
            if day.name.trim().is_empty() {
                return Err(AppError::Validation(
                    "routine day name must not be empty".to_string(),
                ));
            }
            for exercise in &day.exercises {
                if exercise.name.trim().is_empty() {
                    return Err(AppError::Validation(
                        "exercise name must not be empty".to_string(),
                    ));
                }
                if exercise.sets == 0 {
                    return Err(AppError::Validation(format!(
                        "{} must have at least one set",
                        exercise.name.trim()
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanDay, PlanWeek, PlannedExercise, Rpe};

    const EXERCISE_ID: &str = "6f1c3a52-2f0e-4c1b-9a57-0d5b1f8f2a11";

    fn new_log() -> NewExerciseLog {
        NewExerciseLog {
            exercise_id: EXERCISE_ID.to_string(),
            set_number: 1,
            weight: Some(80.0),
            reps: Some(10),
            rpe: Some(Rpe::new(7).unwrap()),
            notes: None,
        }
    }

    #[test]
    fn test_parse_uuid_canonicalises() {
        let id = parse_uuid("6F1C3A52-2F0E-4C1B-9A57-0D5B1F8F2A11", "id").unwrap();
        assert_eq!(id, EXERCISE_ID);
    }

    #[test]
    fn test_parse_uuid_rejects_garbage() {
        let err = parse_uuid("not-a-uuid", "sessionId").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("sessionId")));
    }

    #[test]
    fn test_validate_new_log_bounds() {
        assert!(validate_new_log(new_log()).is_ok());

        let mut log = new_log();
        log.weight = Some(1000.5);
        assert!(validate_new_log(log).is_err());

        let mut log = new_log();
        log.weight = Some(-1.0);
        assert!(validate_new_log(log).is_err());

        let mut log = new_log();
        log.reps = Some(0);
        assert!(validate_new_log(log).is_err());

        let mut log = new_log();
        log.set_number = 0;
        assert!(validate_new_log(log).is_err());

        let mut log = new_log();
        log.notes = Some("x".repeat(201));
        assert!(validate_new_log(log).is_err());

        let mut log = new_log();
        log.notes = Some("x".repeat(200));
        assert!(validate_new_log(log).is_ok());
    }

    #[test]
    fn test_validate_new_log_allows_bodyweight_sets() {
        let mut log = new_log();
        log.weight = None;
        log.rpe = None;
        assert!(validate_new_log(log).is_ok());
    }

    #[test]
    fn test_validate_log_update_rejects_empty() {
        let err = validate_log_update(&ExerciseLogUpdate::default()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let update = ExerciseLogUpdate {
            reps: Some(1001),
            ..Default::default()
        };
        assert!(validate_log_update(&update).is_err());
    }

    #[test]
    fn test_validate_completion() {
        assert!(validate_completion(&CompletionData::default()).is_ok());

        let data = CompletionData {
            actual_duration: Some(301),
            ..Default::default()
        };
        assert!(validate_completion(&data).is_err());

        let data = CompletionData {
            actual_duration: Some(0),
            ..Default::default()
        };
        assert!(validate_completion(&data).is_err());

        let data = CompletionData {
            notes: Some("y".repeat(501)),
            ..Default::default()
        };
        assert!(validate_completion(&data).is_err());
    }

    #[test]
    fn test_page_limit() {
        assert_eq!(page_limit(None).unwrap(), 10);
        assert_eq!(page_limit(Some(100)).unwrap(), 100);
        assert!(page_limit(Some(101)).is_err());
        assert!(page_limit(Some(0)).is_err());
        assert!(page_offset(Some(-1)).is_err());
        assert_eq!(page_offset(None).unwrap(), 0);
    }

    #[test]
    fn test_parse_date_bound() {
        let from = parse_date_bound("2024-03-01", "fromDate", false).unwrap();
        assert_eq!(from.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        let to = parse_date_bound("2024-03-01", "toDate", true).unwrap();
        assert!(to > from);
        assert_eq!(to.date_naive(), from.date_naive());

        let ts = parse_date_bound("2024-03-01T12:30:00+02:00", "fromDate", false).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:30:00+00:00");

        assert!(parse_date_bound("yesterday", "fromDate", false).is_err());
    }

    #[test]
    fn test_validate_plan() {
        let mut plan = WorkoutPlan {
            name: "Base".to_string(),
            description: None,
            weeks: vec![PlanWeek {
                week_number: 1,
                days: vec![PlanDay {
                    day_number: 1,
                    name: "Legs".to_string(),
                    exercises: vec![PlannedExercise {
                        name: "Squat".to_string(),
                        sets: 5,
                        reps: "5".to_string(),
                        rest_seconds: None,
                        notes: None,
                    }],
                }],
            }],
        };
        assert!(validate_plan(&plan).is_ok());

        plan.weeks[0].days[0].exercises[0].sets = 0;
        assert!(validate_plan(&plan).is_err());

        plan.weeks.clear();
        assert!(validate_plan(&plan).is_err());
    }
}
