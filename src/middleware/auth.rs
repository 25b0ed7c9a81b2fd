use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::UserProfile;
use crate::state::AppState;

/// Claims minted by the external authentication service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub exp: usize,
}

/// Verified requester identity, extracted from the bearer token.
///
/// Accepts `Authorization: Bearer <token>` or the legacy `x-auth-token`
/// header. Token issuance lives with the authentication service; this
/// extractor only verifies.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
}

impl AuthUser {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

fn extract_token(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    bearer.or_else(|| {
        parts
            .headers
            .get("x-auth-token")
            .and_then(|h| h.to_str().ok())
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)
            .ok_or_else(|| AppError::AuthRequired("No token provided".to_string()))?;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            AppError::AuthRequired("Invalid token".to_string())
        })?;

        let user = AuthUser {
            id: data.claims.id,
            username: data.claims.username,
            avatar: data.claims.avatar,
        };

        // Keep the directory aware of identities seen on verified requests;
        // failures here must not block the request itself.
        if let Err(e) = state.directory.remember(&user.profile()).await {
            tracing::warn!(error = %e, "Failed to record identity");
        }

        Ok(user)
    }
}
