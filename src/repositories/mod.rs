pub mod auth_token_repo;
pub mod plan_repo;
pub mod session_repo;
pub mod sqlite_session_repo;

use std::sync::Arc;

use crate::db::DbPool;

pub use auth_token_repo::AuthTokenRepository;
pub use plan_repo::PlanRepository;
pub use session_repo::SessionRepository;
pub use sqlite_session_repo::SqliteSessionRepository;

/// Build the session repository for one request, bound to the identity the
/// identity provider resolved for it (if any).
pub fn create_session_repository(
    pool: DbPool,
    current_user: Option<String>,
) -> Arc<dyn SessionRepository> {
    Arc::new(SqliteSessionRepository::new(pool, current_user))
}
