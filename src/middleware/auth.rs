use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    Extension,
};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::repositories::AuthTokenRepository;

pub const SESSION_COOKIE_NAME: &str = "session";

/// The caller as established by the identity provider's token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn cookie_token(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(tokens) = Extension::<AuthTokenRepository>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Internal(e.body_text()))?;

        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or(AppError::Unauthorized)?;

        let id = tokens
            .find_valid(&token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser { id })
    }
}
