use std::time::Duration;

use anyhow::Context;
use crm_entrypoint::Environment;

/// Configuration parameters for the application.
#[derive(Debug)]
pub struct Config {
    /// The connection URL for the customers Postgres database
    pub database_url: String,
    /// The port to listen for HTTP requests on.
    pub port: u16,
    /// The environment we are in
    pub environment: Environment,
    /// Overrides the per-environment pool size
    pub database_max_connections: Option<u32>,
    /// How long a request waits for a pooled connection
    pub database_acquire_timeout: Duration,
    /// Apply pending migrations on startup
    pub run_migrations: bool,
    /// Serve reads from the last known customer records while the database is unreachable
    pub customer_cache_enabled: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(Environment::new_or_prod(), |key| std::env::var(key).ok())
    }

    fn from_lookup(
        environment: Environment,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be provided")?;

        let port = match lookup("PORT") {
            Some(port) => port.parse::<u16>().context("PORT must be a valid port number")?,
            None => 8080,
        };

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .map(|max| max.parse::<u32>())
            .transpose()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let acquire_timeout_secs = match lookup("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse::<u64>()
                .context("DATABASE_ACQUIRE_TIMEOUT_SECS must be a number of seconds")?,
            None => 5,
        };

        Ok(Config {
            database_url,
            port,
            environment,
            database_max_connections,
            database_acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            run_migrations: flag(lookup("RUN_MIGRATIONS")),
            customer_cache_enabled: flag(lookup("CUSTOMER_CACHE_ENABLED")),
        })
    }

    /// (min, max) pool size
    pub fn pool_size(&self) -> (u32, u32) {
        let (min, max) = match self.environment {
            Environment::Production => (5, 30),
            Environment::Develop => (3, 20),
            Environment::Local => (3, 10),
        };
        match self.database_max_connections {
            Some(max) => (min.min(max), max),
            None => (min, max),
        }
    }
}

fn flag(value: Option<String>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(Environment::Local, |key| vars.get(key).cloned())
    }

    #[test]
    fn it_applies_defaults() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/crm")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_acquire_timeout, Duration::from_secs(5));
        assert!(!config.run_migrations);
        assert!(!config.customer_cache_enabled);
        assert_eq!(config.pool_size(), (3, 10));
    }

    #[test]
    fn it_requires_a_database_url() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn it_reads_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("PORT", "9000"),
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("DATABASE_ACQUIRE_TIMEOUT_SECS", "1"),
            ("RUN_MIGRATIONS", "true"),
            ("CUSTOMER_CACHE_ENABLED", "1"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.pool_size(), (2, 2));
        assert_eq!(config.database_acquire_timeout, Duration::from_secs(1));
        assert!(config.run_migrations);
        assert!(config.customer_cache_enabled);
    }

    #[test]
    fn it_rejects_a_malformed_port() {
        let err = config(&[("DATABASE_URL", "postgres://localhost/crm"), ("PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
