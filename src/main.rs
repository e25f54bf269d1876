//! Solar Exporter
//!
//! Polls solar inverter monitoring portals and republishes the readings as
//! Prometheus gauges.
//!
//! # Architecture
//!
//! One task per configured site runs a fixed-interval poll loop:
//! fetch the site's status from its portal, fold today's energy into the
//! site's SQLite daily series, derive month/year/best-day figures and
//! publish them. A single HTTP endpoint serves `/metrics`.
//!
//! # Features
//!
//! - SEMS (current and v1 API), SolarEdge, Omnik and Ginlong portals
//! - Per-site history in `<db_dir>/<site>.db`
//! - Graceful shutdown on SIGTERM/SIGINT
//! - Timeout protection for hung portals

mod aggregation;
mod config;
mod error;
mod metrics;
mod model;
mod poll;
mod provider;
mod server;
mod store;

#[cfg(test)]
mod test_utils;

use crate::aggregation::Aggregator;
use crate::config::{ServerConfig, SiteConfig};
use crate::error::ConfigError;
use crate::metrics::SolarMetrics;
use crate::poll::SitePoller;
use crate::store::DailySeriesStore;
use anyhow::Context;
use futures::future::join_all;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::{JoinError, JoinHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_app_config()?;
    tracing_subscriber::fmt()
        .with_max_level(app_config.log_level())
        .init();

    let server_config = config::load_server_config().context("Failed to load ServerConfig")?;
    let sites_config = config::load_sites_config(&server_config.sites_file)
        .context("Failed to load sites file")?;
    let metrics = Arc::new(SolarMetrics::new().context("Failed to register metrics")?);

    let pollers = setup_sites(&server_config, &sites_config.sites, &metrics);
    if pollers.is_empty() {
        anyhow::bail!("No site could be set up");
    }
    let tasks: Vec<(String, JoinHandle<()>)> = pollers
        .into_iter()
        .map(|poller| (poller.site().to_string(), tokio::spawn(poller.run())))
        .collect();

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Running... Press Ctrl-C or send SIGTERM to terminate.");
    let shutdown = shutdown_signal()?;
    if let Err(e) = server::serve(listener, metrics, shutdown).await {
        tracing::error!(error = %e, "Metrics endpoint error");
    }

    let (sites, tasks): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
    for task in &tasks {
        task.abort();
    }
    for (site, result) in sites.iter().zip(join_all(tasks).await) {
        handle_task_result(site, result);
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves once SIGTERM or SIGINT arrives.
fn shutdown_signal() -> anyhow::Result<impl std::future::Future<Output = ()>> {
    let mut sig_term =
        signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
    Ok(async move {
        tokio::select! {
            // containers stop with SIGTERM
            _ = sig_term.recv() => {
                tracing::info!("Received SIGTERM. Exiting...");
            }
            _ = ctrl_c() => {
                tracing::info!("Received SIGINT. Exiting...");
            }
        }
    })
}

/// Builds a poller for every site that can be set up; the others are logged and skipped.
fn setup_sites(
    server_config: &ServerConfig,
    sites: &[SiteConfig],
    metrics: &Arc<SolarMetrics>,
) -> Vec<SitePoller> {
    sites
        .iter()
        .filter_map(|site| match setup_site(server_config, site, metrics) {
            Ok(poller) => Some(poller),
            Err(e) => {
                tracing::error!(site = %site.name, "Failed to set up site: {:?}", e);
                None
            }
        })
        .collect()
}

/// Opens the site's store and builds its provider.
fn setup_site(
    server_config: &ServerConfig,
    site: &SiteConfig,
    metrics: &Arc<SolarMetrics>,
) -> error::Result<SitePoller> {
    if site.name.contains(['/', '\\']) {
        return Err(ConfigError::invalid(
            "site.name",
            format!("[{}] cannot be used as a file name", site.name),
        )
        .into());
    }
    let store = DailySeriesStore::open(server_config.database_file(&site.name))?;
    let provider = provider::build(site, server_config.default_interval_sec)?;
    tracing::info!(site = %site.name, provider = %site.provider.kind(), "Site ready");

    Ok(SitePoller::new(
        provider,
        Aggregator::new(store),
        Arc::clone(metrics),
        Duration::from_secs(server_config.cycle_timeout_sec),
    ))
}

/// Logs how a site task ended.
fn handle_task_result(site: &str, result: Result<(), JoinError>) {
    match result {
        Ok(_) => tracing::debug!("Task {} completed.", site),
        Err(e) if e.is_cancelled() => tracing::debug!("Task {} stopped.", site),
        Err(e) => tracing::error!("Task {} failed: {:?}", site, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_utils::config::{test_solaredge_site, TestServerConfigBuilder};
    use tempfile::tempdir;

    mod setup_site {
        use super::*;

        #[test]
        fn succeeds() {
            let dir = tempdir().unwrap();
            let server_config = TestServerConfigBuilder::new(dir.path()).build();
            let metrics = Arc::new(SolarMetrics::new().unwrap());

            let poller = setup_site(
                &server_config,
                &test_solaredge_site("roof", "http://127.0.0.1:1"),
                &metrics,
            )
            .unwrap();

            assert_eq!(poller.site(), "roof");
            assert!(dir.path().join("roof.db").exists());
        }

        #[test]
        fn fails() {
            let dir = tempdir().unwrap();
            let server_config = TestServerConfigBuilder::new(dir.path().join("gone")).build();
            let metrics = Arc::new(SolarMetrics::new().unwrap());

            let err = setup_site(
                &server_config,
                &test_solaredge_site("roof", "http://127.0.0.1:1"),
                &metrics,
            )
            .err()
            .unwrap();
            assert!(matches!(err, Error::Storage(_)));

            let err = setup_site(
                &TestServerConfigBuilder::new(dir.path()).build(),
                &test_solaredge_site("../roof", "http://127.0.0.1:1"),
                &metrics,
            )
            .err()
            .unwrap();
            assert!(matches!(err, Error::Config(_)));
        }
    }

    mod setup_sites {
        use super::*;

        #[test]
        fn skips_broken_sites() {
            let dir = tempdir().unwrap();
            let server_config = TestServerConfigBuilder::new(dir.path()).build();
            let metrics = Arc::new(SolarMetrics::new().unwrap());
            let sites = vec![
                test_solaredge_site("roof", "http://127.0.0.1:1"),
                test_solaredge_site("bad/name", "http://127.0.0.1:1"),
                test_solaredge_site("shed", "http://127.0.0.1:1"),
            ];

            let pollers = setup_sites(&server_config, &sites, &metrics);

            let names: Vec<_> = pollers.iter().map(|p| p.site().to_string()).collect();
            assert_eq!(names, vec!["roof", "shed"]);
        }
    }

    mod handle_task_result {
        use super::*;

        #[test]
        fn succeeds() {
            handle_task_result("roof", Ok(()));
        }

        #[tokio::test]
        async fn fails() {
            let handle = tokio::spawn(async {
                panic!("Task panicked");
            });
            handle_task_result("roof", handle.await);
        }

        #[tokio::test]
        async fn cancelled() {
            let handle = tokio::spawn(std::future::pending::<()>());
            handle.abort();
            handle_task_result("roof", handle.await);
        }
    }
}
