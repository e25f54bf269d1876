//! Configuration utilities for testing.

use crate::config::{ProviderConfig, ServerConfig, SiteConfig};
use std::path::{Path, PathBuf};

/// Builder for test server configurations.
#[derive(Debug)]
pub struct TestServerConfigBuilder {
    port: u16,
    db_dir: PathBuf,
    default_interval_sec: u64,
    cycle_timeout_sec: u64,
}

impl TestServerConfigBuilder {
    pub fn new(db_dir: impl AsRef<Path>) -> Self {
        Self {
            port: 0,
            db_dir: db_dir.as_ref().to_path_buf(),
            default_interval_sec: 60,
            cycle_timeout_sec: 5,
        }
    }

    pub fn with_default_interval(mut self, seconds: u64) -> Self {
        self.default_interval_sec = seconds;
        self
    }

    pub fn with_cycle_timeout(mut self, seconds: u64) -> Self {
        self.cycle_timeout_sec = seconds;
        self
    }

    pub fn build(self) -> ServerConfig {
        ServerConfig {
            port: self.port,
            db_dir: self.db_dir,
            default_interval_sec: self.default_interval_sec,
            sites_file: PathBuf::from("sites.toml"),
            cycle_timeout_sec: self.cycle_timeout_sec,
        }
    }
}

/// SolarEdge site pointed at `base_url`; handy because it needs a single request.
pub fn test_solaredge_site(name: &str, base_url: impl Into<String>) -> SiteConfig {
    SiteConfig {
        name: name.to_string(),
        interval_sec: None,
        provider: ProviderConfig::SolarEdge {
            api_key: "test-key".to_string(),
            pid: "1".to_string(),
            base_url: Some(base_url.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_builder() {
        let config = TestServerConfigBuilder::new("/tmp/solar")
            .with_default_interval(30)
            .with_cycle_timeout(2)
            .build();

        assert_eq!(config.db_dir, PathBuf::from("/tmp/solar"));
        assert_eq!(config.default_interval_sec, 30);
        assert_eq!(config.cycle_timeout_sec, 2);
        assert_eq!(config.database_file("roof"), PathBuf::from("/tmp/solar/roof.db"));
    }

    #[test]
    fn test_solaredge_site_builds_site() {
        let site = test_solaredge_site("roof", "http://mock.local");
        assert_eq!(site.name, "roof");
        assert_eq!(site.interval_sec(45), 45);
    }
}
