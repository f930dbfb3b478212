use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::{
    auth::{
        jwt::{JwtKeys, TokenError},
        repo_types::User,
        services::CredentialStore,
    },
    error::AppError,
    state::AppState,
};

/// The authenticated caller, resolved from the bearer token.
///
/// Handlers that take this extractor are only reached with a valid token for a user that
/// still exists.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::unauthenticated("Token is missing"))?
            .to_str()
            .map_err(|_| AppError::unauthenticated("Invalid authorization header"))?;

        // Expect "Bearer <token>"
        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthenticated("Invalid authorization header"))?;

        let keys = JwtKeys::from_ref(state);
        let user_id = keys.verify(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            match e {
                TokenError::Expired => AppError::unauthenticated("Token has expired"),
                TokenError::Malformed => AppError::unauthenticated("Invalid token"),
            }
        })?;

        let user = CredentialStore::from_ref(state)
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user_id, "token for unknown user");
                AppError::unauthenticated("User not found")
            })?;

        Ok(AuthUser(user))
    }
}
