use serde::{Deserialize, Serialize};

/// A multi-week plan as produced by the external plan generator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
    pub name: String,
    pub description: Option<String>,
    pub weeks: Vec<PlanWeek>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanWeek {
    pub week_number: u32,
    pub days: Vec<PlanDay>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDay {
    pub day_number: u32,
    pub name: String,
    pub exercises: Vec<PlannedExercise>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedExercise {
    pub name: String,
    pub sets: u32,
    /// Free-form target such as "8-10" or "AMRAP".
    pub reps: String,
    pub rest_seconds: Option<u32>,
    pub notes: Option<String>,
}

impl WorkoutPlan {
    pub fn day_count(&self) -> usize {
        self.weeks.iter().map(|w| w.days.len()).sum()
    }
}

/// Identifiers assigned when a generated plan is stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedPlan {
    pub plan_id: String,
    pub routine_days: Vec<ImportedRoutineDay>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedRoutineDay {
    pub id: String,
    pub week_number: u32,
    pub day_number: u32,
    pub name: String,
    pub exercises: Vec<ImportedExercise>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedExercise {
    pub exercise_id: String,
    pub name: String,
}
