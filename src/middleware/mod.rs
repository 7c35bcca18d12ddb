use axum::{
    extract::OptionalFromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;

use crate::models::User;

/// The authenticated principal, threaded explicitly into every handler that
/// needs it. Extracted from HTTP Basic credentials checked against the
/// users table.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub user_name: String,
    pub email: String,
}

/// Ownership guard: only an event's creator may mutate it. False for an
/// anonymous principal, never an error.
pub fn is_event_creator(principal: Option<&AuthUser>, created_by: i64) -> bool {
    match principal {
        Some(user) => user.user_id == created_by,
        None => false,
    }
}

// Basic Auth extractor. Handlers take Option<AuthUser>: a missing header or
// bad credentials yield None (the request proceeds as anonymous and the
// handler decides how to redirect), only infrastructure failures reject.
impl OptionalFromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Option<Self>, Self::Rejection> {
        // Grab the Authorization header
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let Some(auth_header) = auth_header else {
            return Ok(None);
        };

        // Must be Basic auth
        let Some(encoded) = auth_header.strip_prefix("Basic ") else {
            return Ok(None);
        };

        // Decode base64 into email:password
        let Ok(decoded) = general_purpose::STANDARD.decode(encoded) else {
            return Ok(None);
        };
        let Ok(credentials) = String::from_utf8(decoded) else {
            return Ok(None);
        };

        let mut split = credentials.splitn(2, ':');
        let (Some(email), Some(password)) = (split.next(), split.next()) else {
            return Ok(None);
        };

        // Look the user up and check the bcrypt hash
        let user = User::find_by_email(email, &state.db).await.map_err(|e| {
            tracing::error!("auth lookup failed for {}: {:?}", email, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        let Some(user) = user else {
            return Ok(None);
        };

        if !user.verify_password(password) {
            return Ok(None);
        }

        Ok(Some(AuthUser {
            user_id: user.id,
            user_name: user.user_name,
            email: user.email,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> AuthUser {
        AuthUser {
            user_id: id,
            user_name: "marco".to_string(),
            email: "marco@example.com".to_string(),
        }
    }

    #[test]
    fn creator_passes_guard() {
        let principal = user(7);
        assert!(is_event_creator(Some(&principal), 7));
    }

    #[test]
    fn non_creator_fails_guard() {
        let principal = user(8);
        assert!(!is_event_creator(Some(&principal), 7));
    }

    #[test]
    fn anonymous_fails_guard_without_error() {
        assert!(!is_event_creator(None, 7));
    }
}
