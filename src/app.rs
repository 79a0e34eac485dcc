//! Wiring: configuration to registry, CDP driver, coordinator and the pump
//! that feeds scraper reports back into the coordinator.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use fanout_browser_cdp::{CdpDriverConfig, CdpTabDriver};
use fanout_config::{Config, ConfigValidator};
use fanout_core::{Coordinator, CoordinatorSettings, PlatformRegistry};
use fanout_protocols::ScrapeReport;

pub(crate) struct App {
    pub config: Config,
    pub coordinator: Coordinator,
    _pump: JoinHandle<()>,
}

impl App {
    /// Validate `config` and start the coordinator against the configured
    /// Chrome. The browser itself is contacted lazily.
    pub fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let validation = ConfigValidator::ensure_valid(&config)?;
        for warning in &validation.warnings {
            warn!("Config warning at {}: {}", warning.path, warning.message);
        }

        let registry = Arc::new(PlatformRegistry::from_config(&config.platforms)?);
        info!(
            "Registered {} platform(s), enabled: {:?}",
            registry.len(),
            registry.enabled()
        );

        let driver_config = CdpDriverConfig::from(&config.browser);
        info!(
            "Using Chrome at {} with scrapers from {}",
            driver_config.endpoint,
            driver_config.scripts_dir.display()
        );
        let (driver, reports) = CdpTabDriver::new(driver_config);

        let coordinator = Coordinator::new(
            registry,
            Arc::new(driver),
            CoordinatorSettings::from(&config.coordinator),
        );
        let pump = spawn_report_pump(reports, coordinator.clone());

        Ok(Self {
            config,
            coordinator,
            _pump: pump,
        })
    }
}

/// Forward every scraper report to the coordinator until the driver drops
/// its sender.
pub(crate) fn spawn_report_pump(
    mut reports: mpsc::UnboundedReceiver<ScrapeReport>,
    coordinator: Coordinator,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(report) = reports.recv().await {
            debug!("Scraper report for {}", report.platform());
            coordinator.handle_report(report);
        }
        debug!("Report pump stopped");
    })
}
