//! Portal protocol clients and the factory mapping site configuration to them.

pub mod client;
pub mod ginlong;
pub mod omnik;
pub mod sems;
pub mod sems_legacy;
pub mod solaredge;

use crate::config::{ProviderConfig, SiteConfig};
use crate::error::ProviderError;
use crate::model::SolarStatusProvider;
use std::time::Duration;

/// Identity and cadence shared by every provider instance.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSettings {
    pub site: String,
    pub interval: Duration,
}

impl SiteSettings {
    pub fn new(site: impl Into<String>, interval: Duration) -> Self {
        Self {
            site: site.into(),
            interval,
        }
    }
}

/// Builds the client for `site`, resolving its poll interval against the default.
pub fn build(
    site: &SiteConfig,
    default_interval_sec: u64,
) -> Result<Box<dyn SolarStatusProvider>, ProviderError> {
    let settings = SiteSettings::new(
        site.name.clone(),
        Duration::from_secs(site.interval_sec(default_interval_sec)),
    );
    tracing::debug!(
        site = %site.name,
        provider = %site.provider.kind(),
        interval = ?settings.interval,
        "Building provider"
    );

    let provider: Box<dyn SolarStatusProvider> = match site.provider.clone() {
        ProviderConfig::Sems {
            account,
            password,
            base_url,
        } => Box::new(sems::SemsProvider::new(settings, account, password, base_url)?),
        ProviderConfig::SemsLegacy {
            account,
            password,
            base_url,
        } => Box::new(sems_legacy::SemsLegacyProvider::new(
            settings, account, password, base_url,
        )?),
        ProviderConfig::SolarEdge {
            api_key,
            pid,
            base_url,
        } => Box::new(solaredge::SolarEdgeProvider::new(
            settings, api_key, pid, base_url,
        )?),
        ProviderConfig::Omnik { base_url, pid } => {
            Box::new(omnik::OmnikProvider::new(settings, base_url, pid)?)
        }
        ProviderConfig::Ginlong {
            username,
            password,
            pid,
            base_url,
        } => Box::new(ginlong::GinlongProvider::new(
            settings, username, password, pid, base_url,
        )?),
    };
    Ok(provider)
}
