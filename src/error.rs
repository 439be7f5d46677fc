use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    /// Shared by unknown email and wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account is deactivated")]
    AccountDeactivated,
    #[error("Access denied")]
    Forbidden,
    #[error("Missing Authorization header")]
    MissingToken,
    #[error("Invalid token")]
    TokenInvalid,
    #[error("Token expired")]
    TokenExpired,
    #[error("User not found")]
    UserNotFound,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Internal server error")]
    Server(#[from] anyhow::Error),
}

impl AuthError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AuthError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::AccountDeactivated
            | AuthError::MissingToken
            | AuthError::TokenInvalid
            | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "validation_error",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountDeactivated => "account_deactivated",
            AuthError::Forbidden => "forbidden",
            AuthError::MissingToken => "token_missing",
            AuthError::TokenInvalid => "token_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::UserNotFound => "user_not_found",
            AuthError::EmailTaken => "email_taken",
            AuthError::Server(_) => "server_error",
        }
    }
}

/// Internal detail of a server error, attached to the response extensions.
/// Only [`expose_error_details`] ever writes it into a body.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        let mut response = (status, body).into_response();
        if let AuthError::Server(e) = &self {
            error!(error = ?e, "request failed");
            response
                .extensions_mut()
                .insert(ErrorDetail(format!("{e:#}")));
        }
        response
    }
}

/// Development-only layer: rewrites 500 bodies to include the internal detail.
pub async fn expose_error_details(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (parts, _) = response.into_parts();
    let body = Json(json!({
        "error": "Internal server error",
        "code": "server_error",
        "detail": detail,
    }));
    (parts.status, body).into_response()
}
