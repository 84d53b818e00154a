use anyhow::Context;
use serde::Deserialize;

/// Value deployments put in the database URL while building without a database.
pub const PLACEHOLDER_DATABASE_URL: &str = "placeholder_connection_string";

/// Connection variables and the values a build environment fills them with.
const PLACEHOLDER_ENV: [(&str, &str); 5] = [
    ("POSTGRES_URL", PLACEHOLDER_DATABASE_URL),
    ("POSTGRES_USER", "placeholder_user"),
    ("POSTGRES_HOST", "placeholder_host"),
    ("POSTGRES_PASSWORD", "placeholder_password"),
    ("POSTGRES_DATABASE", "placeholder_database"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Return the raw seeding error to the client instead of a generic message.
    pub expose_seed_errors: bool,
    /// Some connection variable carries a build placeholder.
    #[serde(default)]
    pub placeholder_env: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let placeholder_env = has_placeholder(|key| std::env::var(key).ok());
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("POSTGRES_URL"))
            .or_else(|e| {
                if placeholder_env {
                    Ok(PLACEHOLDER_DATABASE_URL.to_string())
                } else {
                    Err(e)
                }
            })
            .context("DATABASE_URL or POSTGRES_URL must be set")?;
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);
        let expose_seed_errors = std::env::var("SEED_EXPOSE_ERRORS")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Ok(Self {
            database_url,
            max_connections,
            expose_seed_errors,
            placeholder_env,
        })
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder_env || self.database_url == PLACEHOLDER_DATABASE_URL
    }
}

fn has_placeholder(lookup: impl Fn(&str) -> Option<String>) -> bool {
    PLACEHOLDER_ENV
        .iter()
        .any(|&(key, placeholder)| lookup(key).as_deref() == Some(placeholder))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
