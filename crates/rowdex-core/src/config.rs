//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Nested keys in env vars are separated by `__` (`APP_INDEXER__BATCH_SIZE`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_INDEX: &str = "jotundata";

pub struct Config {
    figment: Figment,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub indexer: IndexerSettings,
    pub store: StoreSettings,
    pub transform: TransformSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub path: String,
}

impl Default for SourceSettings {
    fn default() -> Self { Self { path: "data/alerts_table_hullkeeper.csv".to_string() } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerSettings {
    pub batch_size: usize,
    pub index: String,
    pub template_name: String,
    /// Defaults to `<index>*` when empty.
    pub template_pattern: String,
    pub geo_field: String,
    /// Abort threshold for consecutive failed flushes; 0 never aborts.
    pub max_consecutive_failures: u32,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            index: DEFAULT_INDEX.to_string(),
            template_name: DEFAULT_INDEX.to_string(),
            template_pattern: String::new(),
            geo_field: "location".to_string(),
            max_consecutive_failures: 0,
        }
    }
}

impl IndexerSettings {
    pub fn effective_template_pattern(&self) -> String {
        if self.template_pattern.is_empty() { format!("{}*", self.index) } else { self.template_pattern.clone() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Elastic,
    Tantivy,
}

impl std::str::FromStr for StoreKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "elastic" | "elasticsearch" => Ok(StoreKind::Elastic),
            "tantivy" => Ok(StoreKind::Tantivy),
            other => Err(crate::error::Error::InvalidConfig(format!("unknown store kind '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub kind: StoreKind,
    pub elastic: ElasticSettings,
    pub tantivy: TantivySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticSettings {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ElasticSettings {
    fn default() -> Self {
        Self { url: "http://localhost:9200".to_string(), username: None, password: None, timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TantivySettings {
    pub index_dir: String,
    pub writer_memory_bytes: usize,
}

impl Default for TantivySettings {
    fn default() -> Self {
        Self { index_dir: "../dev_data/indexes/tantivy".to_string(), writer_memory_bytes: 50_000_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    pub date_fields: Vec<String>,
    pub latitude_field: String,
    pub longitude_field: String,
    pub geo_field: String,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            date_fields: vec!["ETA".to_string(), "Final Date".to_string(), "Initial Date".to_string()],
            latitude_field: "Latitude".to_string(),
            longitude_field: "Longitude".to_string(),
            geo_field: "location".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Build from an inline TOML document layered over the defaults.
    pub fn from_toml_str(toml: &str) -> anyhow::Result<Self> {
        let figment = Figment::new().merge(Toml::string(toml));
        let config = Self { figment };
        config.validate_for_env("test")?;
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
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if settings.indexer.batch_size == 0 {
            return Err(crate::error::Error::InvalidConfig("indexer.batch_size must be at least 1".to_string()).into());
        }
        if settings.indexer.index.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig("indexer.index must not be empty".to_string()).into());
        }
        let is_prod = matches!(env, "prod" | "production");
        if is_prod && settings.store.kind == StoreKind::Elastic && settings.store.elastic.timeout_secs == 0 {
            return Err(crate::error::Error::InvalidConfig("store.elastic.timeout_secs must be set in production".to_string()).into());
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
