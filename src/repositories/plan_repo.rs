use chrono::Utc;
use rusqlite::Transaction;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{ImportedExercise, ImportedPlan, ImportedRoutineDay, WorkoutPlan};

/// Stores generated plans so their routine days can be trained against.
#[derive(Clone)]
pub struct PlanRepository {
    pool: DbPool,
}

impl PlanRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Persist a generated plan for `user_id` in one transaction.
    /// Exercises are shared across plans and matched by name, ignoring case.
    pub async fn import_plan(&self, user_id: &str, plan: WorkoutPlan) -> Result<ImportedPlan> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || -> Result<ImportedPlan> {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            let plan_id = Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO workout_plans (id, user_id, name, description, created_at)
                 VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![plan_id, user_id, plan.name, plan.description, Utc::now()],
            )?;

            let mut routine_days = Vec::with_capacity(plan.day_count());
            for week in &plan.weeks {
                for day in &week.days {
                    let day_id = Uuid::new_v4().to_string();
                    tx.execute(
                        "INSERT INTO routine_days (id, plan_id, week_number, day_number, name)
                         VALUES (?, ?, ?, ?, ?)",
                        rusqlite::params![day_id, plan_id, week.week_number, day.day_number, day.name],
                    )?;

                    let mut exercises = Vec::with_capacity(day.exercises.len());
                    for (position, planned) in day.exercises.iter().enumerate() {
                        let exercise = find_or_create_exercise(&tx, &planned.name)?;
                        tx.execute(
                            "INSERT INTO routine_day_exercises
                                (routine_day_id, exercise_id, position, sets, reps, rest_seconds, notes)
                             VALUES (?, ?, ?, ?, ?, ?, ?)",
                            rusqlite::params![
                                day_id,
                                exercise.exercise_id,
                                position as i64,
                                planned.sets,
                                planned.reps,
                                planned.rest_seconds,
                                planned.notes
                            ],
                        )?;
                        exercises.push(exercise);
                    }

                    routine_days.push(ImportedRoutineDay {
                        id: day_id,
                        week_number: week.week_number,
                        day_number: day.day_number,
                        name: day.name.clone(),
                        exercises,
                    });
                }
            }

            tx.commit()?;
            Ok(ImportedPlan {
                plan_id,
                routine_days,
            })
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| e.in_operation("import_plan"))
    }
}

fn find_or_create_exercise(tx: &Transaction, name: &str) -> Result<ImportedExercise> {
    let name = name.trim();
    tx.execute(
        "INSERT INTO exercises (id, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING",
        rusqlite::params![Uuid::new_v4().to_string(), name],
    )?;
    let exercise = tx.query_row(
        "SELECT id, name FROM exercises WHERE name = ?",
        [name],
        |row| {
            Ok(ImportedExercise {
                exercise_id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )?;
    Ok(exercise)
}
