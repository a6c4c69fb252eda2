pub mod exercise_logs;
pub mod health;
pub mod plans;
pub mod sessions;
pub mod stats;
