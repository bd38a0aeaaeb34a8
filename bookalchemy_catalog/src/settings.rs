use serde::Deserialize;

use crate::library_repository::PostgresLibraryRepositoryConfig;

/// Prefix of environment variables read into [`Settings`], e.g. `BOOKALCHEMY_DB_HOST`
pub const ENV_PREFIX: &str = "BOOKALCHEMY";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub use_in_memory_db: bool,
    #[serde(default = "default_db_host")]
    pub db_host: String,
    #[serde(default = "default_db_credential")]
    pub db_username: String,
    #[serde(default = "default_db_credential")]
    pub db_password: String,
    /// Export spans to a local Jaeger agent
    #[serde(default)]
    pub jaeger_enabled: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_db_host() -> String {
    "127.0.0.1".to_string()
}

fn default_db_credential() -> String {
    "postgres".to_string()
}

impl Settings {
    /// Reads the optional `bookalchemy.toml` file, then `BOOKALCHEMY_*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_sources(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn from_sources(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("bookalchemy").required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    pub fn postgres_config(&self) -> PostgresLibraryRepositoryConfig {
        PostgresLibraryRepositoryConfig {
            hostname: self.db_host.clone(),
            username: self.db_username.clone(),
            password: self.db_password.clone(),
        }
    }
}
