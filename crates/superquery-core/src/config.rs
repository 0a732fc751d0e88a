//! Configuration loader for execution settings.
//!
//! Uses Figment to merge built-in defaults, `config.toml`, `config.<env>.toml`,
//! the legacy unprefixed variables and finally `APP_*` env vars.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_BINARY_PATH: &str = "/usr/local/bin/super";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_RESULTS: usize = 10_000;
pub const DEFAULT_REGION: &str = "us-east-1";

/// Environment variables read without the `APP_` prefix, kept for deployments
/// that already export them.
const LEGACY_ENV_KEYS: [&str; 3] = ["SUPER_BINARY_PATH", "QUERY_TIMEOUT", "MAX_RESULTS"];

/// Process-wide execution settings, resolved once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub super_binary_path: PathBuf,
    /// Seconds.
    pub query_timeout: u64,
    pub max_results: usize,
    pub default_region: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            super_binary_path: PathBuf::from(DEFAULT_BINARY_PATH),
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            max_results: DEFAULT_MAX_RESULTS,
            default_region: DEFAULT_REGION.to_string(),
        }
    }
}

impl Settings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }

    pub fn validate(&self) -> Result<()> {
        if self.query_timeout == 0 {
            return Err(Error::InvalidConfig("query_timeout must be greater than zero".into()));
        }
        if self.max_results == 0 {
            return Err(Error::InvalidConfig("max_results must be greater than zero".into()));
        }
        if self.default_region.trim().is_empty() {
            return Err(Error::InvalidConfig("default_region must not be empty".into()));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment
            .merge(Env::raw().only(&LEGACY_ENV_KEYS))
            .merge(Env::raw().only(&["DEFAULT_AWS_REGION"]).map(|_| "default_region".into()))
            .merge(Env::prefixed("APP_"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// Extract and validate the typed settings. The binary path has `~` and
    /// `$VAR` expanded.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.super_binary_path = expand_path(settings.super_binary_path.to_string_lossy());
        settings.validate()?;
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
