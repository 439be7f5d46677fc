use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            AdminUserView, AuthResponse, ChangePasswordRequest, LoginRequest, MeResponse,
            MessageResponse, PublicUser, RegisterRequest, SetActiveRequest,
        },
        extractors::{AdminUser, AuthUser},
        services::LoginPolicy,
    },
    error::AuthError,
    extract::JsonBody,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/password", put(change_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/auth/login", post(admin_login))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id/status", patch(set_user_status))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let res = state
        .auth
        .login(&payload.email, &payload.password, LoginPolicy::PUBLIC)
        .await?;
    Ok(Json(res))
}

#[instrument(skip(state, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let res = state
        .auth
        .login(&payload.email, &payload.password, LoginPolicy::ADMIN)
        .await?;
    Ok(Json(res))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let res = state
        .auth
        .register(&payload.name, &payload.email, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Tokens are self-contained; logging out is the client dropping its copy.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out",
    })
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: PublicUser::from(&user),
    })
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    state
        .auth
        .change_password(&user, &payload.current_password, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password updated",
    }))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<AdminUserView>>, AuthError> {
    let users = state.auth.users().list().await?;
    info!(count = users.len(), "listed users");
    Ok(Json(users.iter().map(AdminUserView::from).collect()))
}

#[instrument(skip_all, fields(admin_id = %admin.id, user_id = %id))]
pub async fn set_user_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<SetActiveRequest>,
) -> Result<Json<AdminUserView>, AuthError> {
    let user = state.auth.set_active(&admin, id, payload.is_active).await?;
    Ok(Json(AdminUserView::from(&user)))
}
