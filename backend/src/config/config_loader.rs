use anyhow::{Context, Result};
use std::str::FromStr;

use super::config_model::{Auth, BackendServer, Database, DotEnvyConfig};

const DEFAULT_MAX_DB_CONNECTIONS: u32 = 10;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?,
        body_limit: required("SERVER_BODY_LIMIT")?,
        timeout: required("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required_string("DATABASE_URL")?,
        max_connections: optional("DATABASE_MAX_CONNECTIONS")?
            .unwrap_or(DEFAULT_MAX_DB_CONNECTIONS),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth: get_auth()?,
    })
}

pub fn get_auth() -> Result<Auth> {
    dotenvy::dotenv().ok();

    Ok(Auth {
        jwt_secret: required_string("JWT_SECRET")?,
    })
}

fn required_string(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} is missing"))
}

fn required<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required_string(key)?
        .trim()
        .parse::<T>()
        .with_context(|| format!("{key} is invalid"))
}

fn optional<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{key} is invalid")),
        _ => Ok(None),
    }
}
