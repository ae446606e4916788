//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge compiled-in defaults, `config.toml`,
//! `config.<env>.toml` and `PERSONDB_*` env vars (`__` separates nesting,
//! e.g. `PERSONDB_SEARCH__MAX_PAGE_SIZE`). Provides helpers to expand `~` and
//! `${VAR}` and to resolve relative paths against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Store path or index dir that keeps the data in memory only.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub store: StoreSettings,
    pub index: IndexSettings,
    pub search: SearchSettings,
    pub init: InitSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSettings {
    pub dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitSettings {
    pub default_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreSettings { path: "data/persons.db".to_string() },
            index: IndexSettings { dir: "data/index".to_string() },
            search: SearchSettings { default_page_size: 10, max_page_size: 1000 },
            init: InitSettings { default_count: 1000 },
            log: LogSettings { level: "info".to_string() },
        }
    }
}

impl SearchSettings {
    /// Page size to use for a request: the default when absent, never above the max.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_page_size).min(self.max_page_size)
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("PERSONDB_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Wraps an already assembled figment, layered over the defaults.
    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config = Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if settings.search.default_page_size == 0 || settings.search.max_page_size == 0 {
            return Err(Error::InvalidConfig("search page sizes must be positive".to_string()).into());
        }
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if matches!(env, "prod" | "production") && settings.store.path == IN_MEMORY {
            return Err(Error::InvalidConfig("in-memory store is not allowed in production".to_string()).into());
        }
        Ok(())
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

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
