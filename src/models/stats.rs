use serde::Serialize;

/// Training totals across all of a user's sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub total_sessions: i64,
    /// Finished normally; abandoned sessions are counted separately.
    pub completed_sessions: i64,
    pub abandoned_sessions: i64,
    /// Sessions started in the rolling seven days before the query.
    pub sessions_last_7_days: i64,
    pub total_sets: i64,
    /// Sum of weight × reps over sets that recorded both.
    pub total_volume: f64,
    pub average_rpe: Option<f64>,
}
