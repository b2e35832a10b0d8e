//! Runtime configuration from environment variables (a `.env` file is loaded first by `main`).
//!
//! - `DATABASE_URL` - PostgreSQL URI (default: `postgres://localhost/ecommerce_api`)
//! - `SHOP_STORAGE` - `postgres` or `memory` (default: `postgres`)
//! - `SHOP_HOST` - bind address (default: 127.0.0.1)
//! - `SHOP_PORT` - listen port (default: 5000)
//! - `SHOP_DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `SHOP_BODY_LIMIT_BYTES` - request body limit (default: 65536)

use crate::error::ConfigError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/ecommerce_api";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Where entities are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process-local tables; contents are lost on exit.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::Invalid {
                var: "SHOP_STORAGE",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub storage: StorageBackend,
    pub host: IpAddr,
    pub port: u16,
    pub max_connections: u32,
    pub body_limit_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let storage = match lookup("SHOP_STORAGE") {
            Some(v) => v.parse()?,
            None => StorageBackend::Postgres,
        };
        Ok(AppConfig {
            database_url,
            storage,
            host: parse_var(&lookup, "SHOP_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: parse_var(&lookup, "SHOP_PORT", DEFAULT_PORT)?,
            max_connections: parse_var(&lookup, "SHOP_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            body_limit_bytes: parse_var(&lookup, "SHOP_BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { var, value }),
    }
}
