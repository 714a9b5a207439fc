// src/config.rs
use std::collections::HashMap;
use std::net::IpAddr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read once at startup and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    /// Reject customer create/update when another customer already has the name.
    pub unique_customer_names: bool,
    /// Default `limit` for `GET /print-jobs/pending`.
    pub print_job_page_size: i64,
}

impl Config {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            host: parse_or(vars, "HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_or(vars, "PORT", 3000)?,
            db_max_connections: parse_or(vars, "DB_MAX_CONNECTIONS", 10)?,
            run_migrations: parse_flag(vars, "RUN_MIGRATIONS", true)?,
            unique_customer_names: parse_flag(vars, "UNIQUE_CUSTOMER_NAMES", true)?,
            print_job_page_size: parse_or(vars, "PRINT_JOB_PAGE_SIZE", 10)?,
        })
    }

    /// Settings used by tests and tooling that already hold a database URL.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            db_max_connections: 5,
            run_migrations: true,
            unique_customer_names: true,
            print_job_page_size: 10,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw.to_string(),
        }),
    }
}

fn parse_flag(
    vars: &HashMap<String, String>,
    name: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match vars.get(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value: v }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config =
            Config::from_vars(&vars(&[("DATABASE_URL", "postgres://localhost/stock")])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.db_max_connections, 10);
        assert!(config.run_migrations);
        assert!(config.unique_customer_names);
        assert_eq!(config.print_job_page_size, 10);
    }

    #[test]
    fn database_url_is_required() {
        assert_eq!(
            Config::from_vars(&vars(&[("PORT", "8080")])).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_vars(&vars(&[
            ("DATABASE_URL", "postgres://db/stock"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8088"),
            ("UNIQUE_CUSTOMER_NAMES", "off"),
            ("RUN_MIGRATIONS", "0"),
            ("PRINT_JOB_PAGE_SIZE", "25"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8088);
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert!(!config.unique_customer_names);
        assert!(!config.run_migrations);
        assert_eq!(config.print_job_page_size, 25);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let env = vars(&[("DATABASE_URL", "postgres://db/stock"), ("PORT", "eighty")]);
        let err = Config::from_vars(&env).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "eighty".into()
            }
        );
    }
}
