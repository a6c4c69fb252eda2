use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use crate::db::DbPool;
use crate::error::{AppError, Result};

/// Read side of the identity provider's token table. Tokens are minted and
/// written by the provider; this service only resolves them to the user id
/// they were issued for.
#[derive(Clone)]
pub struct AuthTokenRepository {
    pool: DbPool,
}

impl AuthTokenRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Find the user a non-expired token belongs to.
    /// Lazily deletes the token if it has expired.
    pub async fn find_valid(&self, token: &str) -> Result<Option<String>> {
        let pool = self.pool.clone();
        let token = token.to_string();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || -> Result<Option<String>> {
            let conn = pool.get()?;
            let result: Option<(String, DateTime<Utc>)> = conn
                .query_row(
                    "SELECT user_id, expires_at FROM auth_tokens WHERE token = ?",
                    [&token],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match result {
                Some((_, expires_at)) if expires_at <= now => {
                    conn.execute("DELETE FROM auth_tokens WHERE token = ?", [&token])?;
                    Ok(None)
                }
                Some((user_id, _)) => Ok(Some(user_id)),
                None => Ok(None),
            }
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;

    fn repo() -> AuthTokenRepository {
        let pool = create_memory_pool().unwrap();
        run_migrations_for_tests(&pool).unwrap();
        AuthTokenRepository::new(pool)
    }

    fn issue(repo: &AuthTokenRepository, user_id: &str, ttl: Duration) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        repo.pool
            .get()
            .unwrap()
            .execute(
                "INSERT INTO auth_tokens (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
                rusqlite::params![token, user_id, now, now + ttl],
            )
            .unwrap();
        token
    }

    #[tokio::test]
    async fn test_find_valid_returns_user() {
        let repo = repo();
        let token = issue(&repo, "user-1", Duration::hours(1));

        let user_id = repo.find_valid(&token).await.unwrap();
        assert_eq!(user_id.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_find_valid_unknown_token() {
        let repo = repo();
        assert!(repo.find_valid("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_token_is_removed() {
        let repo = repo();
        let token = issue(&repo, "user-1", Duration::seconds(-1));

        assert!(repo.find_valid(&token).await.unwrap().is_none());

        let conn = repo.pool.get().unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM auth_tokens", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
