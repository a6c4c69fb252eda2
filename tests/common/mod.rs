#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use liftplan::db::{create_memory_pool, create_pool, DbPool};
use liftplan::handlers::{plans, sessions};
use liftplan::migrations::run_migrations_for_tests;
use liftplan::models::{ImportedPlan, PlanDay, PlanWeek, PlannedExercise, WorkoutPlan};
use liftplan::repositories::{
    create_session_repository, AuthTokenRepository, PlanRepository, SessionRepository,
};

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

/// A migrated database file with a multi-connection pool, removed on drop.
pub struct FileDb {
    pub pool: DbPool,
    path: PathBuf,
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

pub fn setup_file_db(max_size: u32) -> FileDb {
    let path = std::env::temp_dir().join(format!("liftplan-test-{}.db", uuid::Uuid::new_v4()));
    let pool = create_pool(&format!("sqlite:{}", path.display()), max_size)
        .expect("Failed to create file database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    FileDb { pool, path }
}

pub fn create_test_app(pool: DbPool) -> Router {
    let sessions_state = sessions::SessionsState { pool: pool.clone() };
    let plans_state = plans::PlansState {
        plan_repo: PlanRepository::new(pool.clone()),
    };
    let auth_tokens = AuthTokenRepository::new(pool);

    liftplan::routes::create_router(sessions_state, plans_state, auth_tokens)
}

/// Repository acting on behalf of `user_id`.
pub fn session_repo(pool: &DbPool, user_id: &str) -> Arc<dyn SessionRepository> {
    create_session_repository(pool.clone(), Some(user_id.to_string()))
}

/// Issue a token the way the identity provider does, by writing it to the
/// shared token table.
pub async fn create_test_token(pool: &DbPool, user_id: &str) -> String {
    let token = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now();
    let conn = pool.get().unwrap();
    conn.execute(
        "INSERT INTO auth_tokens (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        rusqlite::params![token, user_id, now, now + chrono::Duration::hours(1)],
    )
    .unwrap();
    token
}

fn planned(name: &str) -> PlannedExercise {
    PlannedExercise {
        name: name.to_string(),
        sets: 3,
        reps: "8-10".to_string(),
        rest_seconds: Some(120),
        notes: None,
    }
}

pub fn test_plan() -> WorkoutPlan {
    WorkoutPlan {
        name: "Upper/Lower".to_string(),
        description: None,
        weeks: vec![PlanWeek {
            week_number: 1,
            days: vec![
                PlanDay {
                    day_number: 1,
                    name: "Push".to_string(),
                    exercises: vec![planned("Bench Press"), planned("Overhead Press")],
                },
                PlanDay {
                    day_number: 2,
                    name: "Pull".to_string(),
                    exercises: vec![planned("Deadlift"), planned("Barbell Row")],
                },
            ],
        }],
    }
}

/// Imports a two-day plan owned by `user_id`.
pub async fn create_test_plan(pool: &DbPool, user_id: &str) -> ImportedPlan {
    PlanRepository::new(pool.clone())
        .import_plan(user_id, test_plan())
        .await
        .unwrap()
}

/// Send a request and decode the JSON body (`Value::Null` when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
