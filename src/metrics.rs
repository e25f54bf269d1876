//! Gauges published for every site.
//!
//! Each gauge is labelled by `site`; the best-day gauge additionally
//! carries the record's date as a label, so the previous label set is
//! removed whenever the record moves to another day.

use crate::model::Snapshot;
use prometheus::{GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::sync::Mutex;

pub struct SolarMetrics {
    registry: Registry,
    power_now: GaugeVec,
    energy_today: GaugeVec,
    energy_month: GaugeVec,
    energy_year: GaugeVec,
    energy_total: GaugeVec,
    day_record: GaugeVec,
    // site -> date currently carried by `day_record`
    record_dates: Mutex<HashMap<String, String>>,
}

impl SolarMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let site_gauge = |name: &str, help: &str| -> Result<GaugeVec, prometheus::Error> {
            let gauge = GaugeVec::new(Opts::new(name, help), &["site"])?;
            registry.register(Box::new(gauge.clone()))?;
            Ok(gauge)
        };

        let power_now = site_gauge("solar_power_now", "Power Now in W")?;
        let energy_today = site_gauge("solar_energy_today", "Energy Today in Wh")?;
        let energy_month = site_gauge("solar_energy_month", "Energy This Month in Wh")?;
        let energy_year = site_gauge("solar_energy_year", "Energy This Year in Wh")?;
        let energy_total = site_gauge("solar_energy_total", "Energy Total in Wh")?;

        let day_record = GaugeVec::new(
            Opts::new("solar_day_record", "Best Day Energy in Wh"),
            &["site", "date"],
        )?;
        registry.register(Box::new(day_record.clone()))?;

        Ok(Self {
            registry,
            power_now,
            energy_today,
            energy_month,
            energy_year,
            energy_total,
            day_record,
            record_dates: Mutex::new(HashMap::new()),
        })
    }

    /// Sets every gauge of `site` from one successful cycle.
    pub fn publish(&self, site: &str, snapshot: &Snapshot) {
        self.power_now.with_label_values(&[site]).set(snapshot.power_now);
        self.energy_today
            .with_label_values(&[site])
            .set(snapshot.energy_today);
        self.energy_month
            .with_label_values(&[site])
            .set(snapshot.energy_month);
        self.energy_year
            .with_label_values(&[site])
            .set(snapshot.energy_year);
        self.energy_total
            .with_label_values(&[site])
            .set(snapshot.energy_total);

        let Some(record) = &snapshot.day_record else {
            return;
        };
        let mut dates = self
            .record_dates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = dates.get(site).filter(|date| **date != record.date) {
            if let Err(e) = self.day_record.remove_label_values(&[site, previous.as_str()]) {
                tracing::debug!(site = %site, "No previous day record to remove: {}", e);
            }
        }
        self.day_record
            .with_label_values(&[site, record.date.as_str()])
            .set(record.value);
        dates.insert(site.to_string(), record.date.clone());
    }

    /// Text exposition of everything registered.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
