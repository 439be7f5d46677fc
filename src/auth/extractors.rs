use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::repo_types::{Role, User};
use crate::{error::AuthError, state::AppState};

/// Bearer-authenticated caller, re-read from the store.
pub struct AuthUser(pub User);

/// Caller whose *current* stored role is admin.
pub struct AdminUser(pub User);

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let (scheme, token) = auth.split_once(' ').ok_or(AuthError::TokenInvalid)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::TokenInvalid);
    }
    Ok(token.trim())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.auth.keys().verify(token).map_err(|e| {
            warn!(code = e.code(), "bearer token rejected");
            e
        })?;
        let user = state.auth.resolve_session(&claims).await?;
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            warn!(user_id = %user.id, "admin route with non-admin account");
            return Err(AuthError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/auth/me");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))).unwrap(), "abc");
        assert_eq!(bearer_token(&parts_with(Some("bearer abc"))).unwrap(), "abc");
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(matches!(
            bearer_token(&parts_with(None)),
            Err(AuthError::MissingToken)
        ));
        for value in ["Basic abc", "Bearer", "Bearer   ", "abc"] {
            assert!(matches!(
                bearer_token(&parts_with(Some(value))),
                Err(AuthError::TokenInvalid)
            ));
        }
    }
}
