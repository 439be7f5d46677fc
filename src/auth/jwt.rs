use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::{claims::Claims, repo_types::User};
use crate::{config::JwtConfig, error::AuthError};

/// Signing and verification keys, built once from [`JwtConfig`].
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::seconds(cfg.ttl_minutes.saturating_mul(60)),
        }
    }
}

impl JwtKeys {
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sign(&self, user: &User) -> Result<String, AuthError> {
        self.sign_at(user, OffsetDateTime::now_utc())
    }

    pub fn sign_at(&self, user: &User, now: OffsetDateTime) -> Result<String, AuthError> {
        let expires_at = now
            .checked_add(self.ttl)
            .ok_or_else(|| AuthError::Server(anyhow::anyhow!("jwt expiry out of range")))?;
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Server(anyhow::anyhow!("jwt encode: {e}")))?;
        debug!(user_id = %user.id, role = user.role.as_str(), "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Checks signature, issuer and audience, then expiry against `now`.
    /// A token is valid strictly before its `exp` second.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            }
        })?;

        if data.claims.exp <= now.unix_timestamp() {
            debug!(user_id = %data.claims.sub, "jwt expired");
            return Err(AuthError::TokenExpired);
        }
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}
