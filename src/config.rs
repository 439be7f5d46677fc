use anyhow::{bail, Context};
use serde::Deserialize;

/// Secrets that ship in sample `.env` files and must never sign production tokens.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "secret",
    "changeme",
    "change-me",
    "dev-secret",
    "your-secret-key",
    "your_jwt_secret",
    "jwt-secret",
];

const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// One year.
const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => bail!("unknown APP_ENV {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub expose_error_details: bool,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let environment = match var("APP_ENV") {
            Some(raw) => Environment::parse(&raw)?,
            None => Environment::Development,
        };

        let jwt = JwtConfig {
            secret: var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "folio-auth".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "folio-clients".into()),
            ttl_minutes: match var("JWT_TTL_MINUTES") {
                Some(raw) => raw
                    .parse::<i64>()
                    .with_context(|| format!("JWT_TTL_MINUTES is not a number: {raw:?}"))?,
                None => 60 * 24,
            },
        };

        let expose_error_details = match environment {
            Environment::Production => false,
            Environment::Development => var("EXPOSE_ERROR_DETAILS")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
                .unwrap_or(true),
        };

        let config = Self {
            database_url,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: match var("APP_PORT") {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("APP_PORT is not a port: {raw:?}"))?,
                None => 8080,
            },
            environment,
            expose_error_details,
            jwt,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let secret = self.jwt.secret.trim();
        if secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if self.jwt.ttl_minutes <= 0 {
            bail!("JWT_TTL_MINUTES must be positive");
        }
        if self.jwt.ttl_minutes > MAX_TTL_MINUTES {
            bail!("JWT_TTL_MINUTES must be at most {MAX_TTL_MINUTES}");
        }
        if self.environment == Environment::Production {
            if PLACEHOLDER_SECRETS.contains(&secret.to_lowercase().as_str()) {
                bail!("JWT_SECRET is a placeholder value; set a real secret in production");
            }
            if secret.len() < MIN_PRODUCTION_SECRET_LEN {
                bail!("JWT_SECRET must be at least {MIN_PRODUCTION_SECRET_LEN} bytes in production");
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
