//! Model definitions for site status, persisted daily records and the
//! snapshot published to the metrics registry.

pub mod traits;
pub mod types;
pub mod units;

use chrono::NaiveDate;

pub use traits::SolarStatusProvider;
pub use types::ProviderKind;

/// Date format used as the store key.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical status of a site from one successful poll.
///
/// Power is in watts, every energy figure in watt-hours.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolarStatus {
    pub power_now: f64,
    pub energy_today: f64,
    pub energy_month: f64,
    pub energy_year: f64,
    pub energy_total: f64,
}

/// Energy produced on one calendar day, as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    /// Day in `YYYY-MM-DD` form
    pub date: String,
    /// Watt-hours
    pub value: f64,
}

impl DailyRecord {
    /// Creates a record for the given day.
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date: date.format(DATE_FORMAT).to_string(),
            value,
        }
    }
}

/// Values published for a site after a successful cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub power_now: f64,
    pub energy_today: f64,
    pub energy_month: f64,
    pub energy_year: f64,
    pub energy_total: f64,
    /// Best day so far; `None` until the store holds a record
    pub day_record: Option<DailyRecord>,
}
