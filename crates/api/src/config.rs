//! Process configuration, read once at startup from the environment.

use std::net::SocketAddr;

use anyhow::{Context, bail};
use chrono::Duration;

use schoolhouse_auth::DEFAULT_BCRYPT_COST;
use schoolhouse_infra::DatabaseConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// `None` issues tokens without an `exp` claim.
    pub jwt_ttl: Option<Duration>,
    pub bcrypt_cost: u32,
    /// `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut bind_addr: SocketAddr = get("BIND_ADDR")
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:3000")?;
        if let Some(port) = get("PORT") {
            let port: u16 = port.parse().context("PORT must be a port number")?;
            bind_addr.set_port(port);
        }

        let Some(jwt_secret) = get("JWT_SECRET") else {
            bail!("JWT_SECRET must be set");
        };

        let jwt_ttl = match get("JWT_TTL_SECS") {
            Some(raw) => {
                let secs: i64 = raw.parse().context("JWT_TTL_SECS must be a whole number of seconds")?;
                if secs <= 0 {
                    bail!("JWT_TTL_SECS must be positive");
                }
                Some(Duration::seconds(secs))
            }
            None => None,
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => raw.parse().context("BCRYPT_COST must be an integer")?,
            None => DEFAULT_BCRYPT_COST,
        };

        let database = match get("DATABASE_URL") {
            Some(url) => {
                let mut db = DatabaseConfig::new(url);
                if let Some(raw) = get("DATABASE_MAX_CONNECTIONS") {
                    db.max_connections = raw
                        .parse()
                        .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;
                }
                Some(db)
            }
            None => None,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            jwt_ttl,
            bcrypt_cost,
            database,
        })
    }

    /// In-memory configuration with the cheapest hash cost, for tests.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 0).into(),
            jwt_secret: jwt_secret.into(),
            jwt_ttl: None,
            bcrypt_cost: 4,
            database: None,
        }
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_ttl", &self.jwt_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let cfg = load(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(cfg.jwt_ttl, None);
        assert_eq!(cfg.bcrypt_cost, 8);
        assert!(cfg.database.is_none());
    }

    #[test]
    fn secret_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
        assert!(load(&[("JWT_SECRET", "  ")]).is_err());
    }

    #[test]
    fn port_overrides_the_default_address() {
        let cfg = load(&[("JWT_SECRET", "s"), ("PORT", "8081")]).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8081);
    }

    #[test]
    fn ttl_and_database_settings_are_parsed() {
        let cfg = load(&[
            ("JWT_SECRET", "s"),
            ("JWT_TTL_SECS", "3600"),
            ("BCRYPT_COST", "10"),
            ("DATABASE_URL", "postgres://localhost/school"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();

        assert_eq!(cfg.jwt_ttl, Some(Duration::hours(1)));
        assert_eq!(cfg.bcrypt_cost, 10);
        let db = cfg.database.unwrap();
        assert_eq!(db.url, "postgres://localhost/school");
        assert_eq!(db.max_connections, 12);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = load(&[("JWT_SECRET", "s"), ("JWT_TTL_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("JWT_TTL_SECS"));
        assert!(load(&[("JWT_SECRET", "s"), ("JWT_TTL_SECS", "-5")]).is_err());
        assert!(load(&[("JWT_SECRET", "s"), ("PORT", "http")]).is_err());
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let cfg = load(&[("JWT_SECRET", "do-not-print")]).unwrap();
        assert!(!format!("{cfg:?}").contains("do-not-print"));
    }
}
