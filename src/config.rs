use std::env;

use chrono::Duration;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Service configuration, read from the environment (and `.env`).
///
/// | Variable | Default |
/// |---|---|
/// | `DATABASE_URL` | required |
/// | `BIND_ADDR` | `127.0.0.1` |
/// | `PORT` | `8080` |
/// | `DB_POOL_SIZE` | `10` |
/// | `SESSION_TTL_HOURS` | `24` |
/// | `AUTH_FLOW_TTL_MINUTES` | `15` |
/// | `RUN_MIGRATIONS` | `true` |
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub pool_size: u32,
    pub auth: AuthSettings,
    pub run_migrations: bool,
}

/// Lifetimes handed to the auth handlers through `web::Data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSettings {
    pub session_ttl: Duration,
    pub flow_ttl: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(24),
            flow_ttl: Duration::minutes(15),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let session_hours: i64 = parse_or(&lookup, "SESSION_TTL_HOURS", 24)?;
        let flow_minutes: i64 = parse_or(&lookup, "AUTH_FLOW_TTL_MINUTES", 15)?;
        if session_hours <= 0 {
            return Err(invalid("SESSION_TTL_HOURS", session_hours));
        }
        if flow_minutes <= 0 {
            return Err(invalid("AUTH_FLOW_TTL_MINUTES", flow_minutes));
        }

        let pool_size: u32 = parse_or(&lookup, "DB_POOL_SIZE", 10)?;
        if pool_size == 0 {
            return Err(invalid("DB_POOL_SIZE", pool_size));
        }

        Ok(Self {
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            pool_size,
            auth: AuthSettings {
                session_ttl: Duration::hours(session_hours),
                flow_ttl: Duration::minutes(flow_minutes),
            },
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
        })
    }
}

fn invalid(key: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| invalid(key, raw)),
    }
}
