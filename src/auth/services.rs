use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    claims::Claims,
    dto::{AuthResponse, PublicUser},
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_decoy_blocking, verify_password_blocking},
    repo::UserStore,
    repo_types::{NewUser, Role, User},
};
use crate::error::AuthError;

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_new_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Which accounts a login entry point admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginPolicy {
    pub require_role: Option<Role>,
}

impl LoginPolicy {
    pub const PUBLIC: Self = Self { require_role: None };
    pub const ADMIN: Self = Self {
        require_role: Some(Role::Admin),
    };
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    /// The one login flow. Checks run in order and the first failure wins:
    /// presence, lookup, active flag, role, password.
    #[instrument(skip(self, password), fields(require_role = ?policy.require_role))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        policy: LoginPolicy,
    ) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::validation("Email and password are required"));
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            verify_decoy_blocking(password.to_owned()).await?;
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            warn!(user_id = %user.id, "login on deactivated account");
            return Err(AuthError::AccountDeactivated);
        }

        if let Some(required) = policy.require_role {
            if user.role != required {
                warn!(user_id = %user.id, role = user.role.as_str(), "login with insufficient role");
                return Err(AuthError::Forbidden);
            }
        }

        let ok = verify_password_blocking(password.to_owned(), user.password_hash.clone()).await?;
        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        self.users
            .touch_last_login(user.id, OffsetDateTime::now_utc())
            .await?;
        let token = self.keys.sign(&user)?;

        info!(user_id = %user.id, role = user.role.as_str(), "user logged in");
        Ok(AuthResponse {
            token,
            expires_in: self.keys.ttl().whole_seconds(),
            user: PublicUser::from(&user),
        })
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        let name = name.trim();
        let email = normalize_email(email);

        if name.is_empty() {
            return Err(AuthError::validation("Name is required"));
        }
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AuthError::validation("Invalid email"));
        }
        check_new_password(password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password_blocking(password.to_owned()).await?;
        let user = self
            .users
            .create(NewUser {
                name: name.to_owned(),
                email,
                password_hash,
                role: Role::User,
            })
            .await?
            .ok_or(AuthError::EmailTaken)?;

        let token = self.keys.sign(&user)?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(AuthResponse {
            token,
            expires_in: self.keys.ttl().whole_seconds(),
            user: PublicUser::from(&user),
        })
    }

    /// Maps verified claims back to the current user record, so role and
    /// active-status changes since issuance take effect.
    pub async fn resolve_session(&self, claims: &Claims) -> Result<User, AuthError> {
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !user.is_active {
            warn!(user_id = %user.id, "token presented for deactivated account");
            return Err(AuthError::AccountDeactivated);
        }
        Ok(user)
    }

    #[instrument(skip(self, user, current, new), fields(user_id = %user.id))]
    pub async fn change_password(
        &self,
        user: &User,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        if current.is_empty() || new.is_empty() {
            return Err(AuthError::validation(
                "Current and new password are required",
            ));
        }
        check_new_password(new)?;

        let ok = verify_password_blocking(current.to_owned(), user.password_hash.clone()).await?;
        if !ok {
            warn!("password change with wrong current password");
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = hash_password_blocking(new.to_owned()).await?;
        self.users
            .update_password_hash(user.id, &password_hash)
            .await?;
        info!("password changed");
        Ok(())
    }

    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn set_active(
        &self,
        admin: &User,
        target: Uuid,
        is_active: bool,
    ) -> Result<User, AuthError> {
        if target == admin.id && !is_active {
            return Err(AuthError::validation("You cannot deactivate your own account"));
        }
        let user = self
            .users
            .set_active(target, is_active)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        info!(user_id = %user.id, is_active, "account status changed");
        Ok(user)
    }
}
