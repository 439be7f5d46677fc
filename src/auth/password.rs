use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use anyhow::Context;
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    // Stand-in digest verified when no account matches, so an unknown email
    // costs one Argon2 run like a wrong password does.
    static ref DECOY_DIGEST: Option<String> = hash_password("folio-auth/no-such-account").ok();
}

/// Produces a salted Argon2id digest in PHC string form.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Constant-time check of `plain` against a stored digest.
/// Errors only when the digest itself is malformed.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Runs [`verify_password`] on the blocking pool; Argon2 is deliberately slow.
pub async fn verify_password_blocking(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash)).await?
}

/// Verifies `plain` against the decoy digest and discards the outcome.
pub async fn verify_decoy_blocking(plain: String) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || {
        let digest = DECOY_DIGEST
            .as_deref()
            .context("decoy digest unavailable")?;
        verify_password(&plain, digest).map(|_| ())
    })
    .await?
}

pub async fn hash_password_blocking(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain)).await?
}
