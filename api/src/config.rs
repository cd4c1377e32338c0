use std::env;
use std::time::Duration;

use anyhow::Context;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Shared secret that allows creating the first administrator
    pub bootstrap_token: Option<String>,
    /// When set, user emails must belong to this domain
    pub allowed_email_domain: Option<String>,
    /// How long a profile's resolved permissions stay cached
    pub permission_cache_ttl: Duration,
    /// Upper bound for CSV uploads
    pub import_max_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: parse_or("PORT", 8080)?,
            bootstrap_token: env::var("BOOTSTRAP_TOKEN").ok().filter(|t| !t.is_empty()),
            allowed_email_domain: env::var("ALLOWED_EMAIL_DOMAIN")
                .ok()
                .map(|d| d.trim().trim_start_matches('@').to_lowercase())
                .filter(|d| !d.is_empty()),
            permission_cache_ttl: Duration::from_secs(parse_or(
                "PERMISSION_CACHE_TTL_SECS",
                300,
            )?),
            import_max_bytes: parse_or("IMPORT_MAX_BYTES", 5 * 1024 * 1024)?,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration for tests that never touch the environment
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/lgpd_tracker_test".to_string(),
            port: 0,
            bootstrap_token: Some("test-bootstrap-token".to_string()),
            allowed_email_domain: None,
            permission_cache_ttl: Duration::from_secs(300),
            import_max_bytes: 1024 * 1024,
        }
    }
}
