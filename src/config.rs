use crate::error::ConfigError;
use crate::model::ProviderKind;
use anyhow::{anyhow, Result};
use serde_derive::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(self.log_level.as_str()).unwrap_or(tracing::Level::INFO)
    }
}

pub(crate) fn load_app_config() -> Result<AppConfig> {
    match envy::from_env::<AppConfig>() {
        Ok(config) => Ok(config),
        Err(err) => Err(anyhow!("Failed to load AppConfig: {}", err)),
    }
}

fn default_port() -> u16 {
    9100
}

fn default_interval_sec() -> u64 {
    60
}

fn default_sites_file() -> PathBuf {
    PathBuf::from("sites.toml")
}

fn default_cycle_timeout_sec() -> u64 {
    120
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    // one `<site>.db` file per site lives here
    pub db_dir: PathBuf,
    #[serde(default = "default_interval_sec")]
    pub default_interval_sec: u64,
    #[serde(default = "default_sites_file")]
    pub sites_file: PathBuf,
    #[serde(default = "default_cycle_timeout_sec")]
    pub cycle_timeout_sec: u64,
}

impl ServerConfig {
    /// Store file for `site`.
    pub fn database_file(&self, site: &str) -> PathBuf {
        self.db_dir.join(format!("{site}.db"))
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if !self.db_dir.is_dir() {
            return Err(ConfigError::invalid(
                "db_dir",
                format!("folder [{}] does not exist", self.db_dir.display()),
            ));
        }
        if self.default_interval_sec == 0 {
            return Err(ConfigError::invalid("default_interval_sec", "must be positive"));
        }
        if self.cycle_timeout_sec == 0 {
            return Err(ConfigError::invalid("cycle_timeout_sec", "must be positive"));
        }
        Ok(self)
    }
}

pub fn load_server_config() -> Result<ServerConfig, ConfigError> {
    envy::prefixed("SERVER_")
        .from_env::<ServerConfig>()
        .map_err(|err| match err {
            envy::Error::MissingValue(field) => ConfigError::missing(field),
            err => ConfigError::env_parse(err),
        })?
        .validate()
}

/// Credentials and identifiers for one portal protocol.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ProviderConfig {
    Sems {
        account: String,
        password: String,
        base_url: Option<String>,
    },
    SemsLegacy {
        account: String,
        password: String,
        base_url: Option<String>,
    },
    #[serde(rename = "solaredge")]
    SolarEdge {
        api_key: String,
        pid: String,
        base_url: Option<String>,
    },
    Omnik {
        base_url: String,
        pid: String,
    },
    Ginlong {
        username: String,
        password: String,
        pid: String,
        base_url: Option<String>,
    },
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::Sems { .. } => ProviderKind::Sems,
            ProviderConfig::SemsLegacy { .. } => ProviderKind::SemsLegacy,
            ProviderConfig::SolarEdge { .. } => ProviderKind::SolarEdge,
            ProviderConfig::Omnik { .. } => ProviderKind::Omnik,
            ProviderConfig::Ginlong { .. } => ProviderKind::Ginlong,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub name: String,
    // falls back to the server default when unset or 0
    pub interval_sec: Option<u64>,
    #[serde(flatten)]
    pub provider: ProviderConfig,
}

impl SiteConfig {
    pub fn interval_sec(&self, default: u64) -> u64 {
        match self.interval_sec {
            Some(sec) if sec > 0 => sec,
            _ => default,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct SitesConfig {
    #[serde(rename = "site", default)]
    pub sites: Vec<SiteConfig>,
}

impl SitesConfig {
    fn validate(self) -> Result<Self, ConfigError> {
        if self.sites.is_empty() {
            return Err(ConfigError::missing("site"));
        }
        let mut seen = HashSet::new();
        for site in &self.sites {
            if site.name.trim().is_empty() {
                return Err(ConfigError::invalid("site.name", "must not be empty"));
            }
            if !seen.insert(site.name.as_str()) {
                return Err(ConfigError::invalid(
                    "site.name",
                    format!("duplicate site [{}]", site.name),
                ));
            }
        }
        Ok(self)
    }
}

pub fn parse_sites_config(content: &str) -> Result<SitesConfig, ConfigError> {
    toml::from_str::<SitesConfig>(content)
        .map_err(|err| ConfigError::invalid("sites", err.to_string()))?
        .validate()
}

pub fn load_sites_config(path: &Path) -> Result<SitesConfig, ConfigError> {
    let display = path.display().to_string();
    let metadata =
        std::fs::metadata(path).map_err(|_| ConfigError::file(&display, "file does not exist"))?;
    if metadata.is_dir() {
        return Err(ConfigError::file(&display, "is a directory, not a normal file"));
    }
    let content = std::fs::read_to_string(path).map_err(|err| ConfigError::file(&display, err))?;
    parse_sites_config(&content)
}
