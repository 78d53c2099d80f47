use clap::Parser;
use secrecy::Secret;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_LISTEN_ADDR: &str = ":3000";

/// Startup flags for the server binary
#[derive(Parser, Debug, Clone)]
#[command(name = "products-api", version, about)]
pub struct Args {
    /// Server listen address
    #[arg(long = "listen-addr", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: String,

    /// Dotenv file holding the DB_* connection settings
    #[arg(long = "env-file", default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,
}

/// Connection parameters for the products database.
///
/// Values are taken as-is: an unset variable becomes an empty string and is
/// only rejected later if the pool cannot be built from it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: Secret<String>,
    pub database: String,
    pub schema: String,
}

impl DbConfig {
    /// Loads `.env` from the working directory, then reads the `DB_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_ENV_FILE)
    }

    /// Loads the given dotenv file, then reads the `DB_*` variables.
    ///
    /// A missing or unreadable file is an error; there is no fallback to the
    /// bare process environment.
    pub fn load_from(env_file: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::from_filename(env_file.as_ref()).map_err(ConfigError::EnvFile)?;

        Self::from_environment(::config::Environment::with_prefix("DB"))
    }

    /// Builds the config from an explicit variable map instead of the process
    /// environment. Keys use the same `DB_*` names.
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_environment(::config::Environment::with_prefix("DB").source(Some(vars)))
    }

    fn from_environment(source: ::config::Environment) -> Result<Self, ConfigError> {
        let config = ::config::Config::builder().add_source(source).build()?;

        let get = |key: &str| config.get::<String>(key).unwrap_or_default();

        Ok(Self {
            host: get("host"),
            port: get("port"),
            username: get("username"),
            password: Secret::new(get("password")),
            database: get("database"),
            schema: get("schema"),
        })
    }
}

/// Resolves a Go-style listen address. A bare `:port` binds every interface.
pub fn resolve_listen_addr(addr: &str) -> Result<SocketAddr, std::net::AddrParseError> {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port).parse(),
        None => addr.parse(),
    }
}
