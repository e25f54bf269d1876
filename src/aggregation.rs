//! Rollups over a site's daily series.
//!
//! Today's energy reading is persisted once per change; month and year
//! totals are sums over the persisted days, and the published totals never
//! fall below what the portal itself reports live.

use crate::error::StorageError;
use crate::model::{DailyRecord, Snapshot, SolarStatus};
use crate::store::DailySeriesStore;
use chrono::NaiveDate;

/// Aggregation engine owning one site's store.
pub struct Aggregator {
    store: DailySeriesStore,
}

impl Aggregator {
    pub fn new(store: DailySeriesStore) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub fn store(&self) -> &DailySeriesStore {
        &self.store
    }

    /// Saves `energy_today` for `today` unless the stored value already matches.
    ///
    /// Returns whether a write happened. Non-finite readings never reach the store.
    pub fn record_today(&self, today: NaiveDate, energy_today: f64) -> Result<bool, StorageError> {
        let DailyRecord { date, value } = DailyRecord::new(today, energy_today);
        if !value.is_finite() {
            return Err(StorageError::NonFinite { date, value });
        }
        if self.store.daily_value(&date)? == Some(value) {
            return Ok(false);
        }
        self.store.save_daily_value(&date, value)?;
        Ok(true)
    }

    /// Sum of the stored days in `today`'s calendar month.
    pub fn month_total(&self, today: NaiveDate) -> Result<f64, StorageError> {
        self.store.sum_by_prefix(&today.format("%Y-%m").to_string())
    }

    /// Sum of the stored days in `today`'s calendar year.
    pub fn year_total(&self, today: NaiveDate) -> Result<f64, StorageError> {
        self.store.sum_by_prefix(&today.format("%Y").to_string())
    }

    /// Best day in the history; `NotFound` while the series is empty.
    pub fn day_record(&self) -> Result<DailyRecord, StorageError> {
        self.store.max_record()
    }

    /// Persists the status and derives everything that gets published.
    pub fn update(&self, today: NaiveDate, status: &SolarStatus) -> Result<Snapshot, StorageError> {
        if self.record_today(today, status.energy_today)? {
            tracing::debug!(date = %today, value = status.energy_today, "Saved today's energy");
        }

        let energy_month = floor(self.month_total(today)?, status.energy_month);
        let energy_year = floor(self.year_total(today)?, status.energy_year);

        let day_record = match self.day_record() {
            Ok(record) => Some(record),
            Err(StorageError::NotFound) => {
                tracing::debug!("No day record yet");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Snapshot {
            power_now: status.power_now,
            energy_today: status.energy_today,
            energy_month,
            energy_year,
            energy_total: status.energy_total,
            day_record,
        })
    }
}

/// Published total: the local aggregate, raised to the portal's live figure
/// when the portal is ahead.
pub fn floor(local: f64, live: f64) -> f64 {
    local.max(live)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn aggregator() -> Aggregator {
        Aggregator::new(DailySeriesStore::open_in_memory().unwrap())
    }

    fn seeded() -> Aggregator {
        let agg = aggregator();
        agg.record_today(day(2024, 3, 1), 10.0).unwrap();
        agg.record_today(day(2024, 3, 2), 20.0).unwrap();
        agg.record_today(day(2024, 4, 1), 5.0).unwrap();
        agg
    }

    mod succeeds {
        use super::*;

        #[test]
        fn test_record_today_is_idempotent() {
            let agg = aggregator();
            assert!(agg.record_today(day(2024, 3, 1), 42.0).unwrap());
            assert!(!agg.record_today(day(2024, 3, 1), 42.0).unwrap());

            assert_eq!(agg.store().record_count().unwrap(), 1);
            assert_eq!(agg.store().daily_value("2024-03-01").unwrap(), Some(42.0));
        }

        #[test]
        fn test_record_today_overwrites_changed_value() {
            let agg = aggregator();
            agg.record_today(day(2024, 3, 1), 42.0).unwrap();
            assert!(agg.record_today(day(2024, 3, 1), 57.5).unwrap());

            assert_eq!(agg.store().record_count().unwrap(), 1);
            assert_eq!(agg.store().daily_value("2024-03-01").unwrap(), Some(57.5));
        }

        #[test]
        fn test_rollups() {
            let agg = seeded();
            assert_eq!(agg.month_total(day(2024, 3, 15)).unwrap(), 30.0);
            assert_eq!(agg.month_total(day(2024, 4, 15)).unwrap(), 5.0);
            assert_eq!(agg.year_total(day(2024, 12, 31)).unwrap(), 35.0);
        }

        #[test]
        fn test_day_record() {
            let agg = seeded();
            assert_eq!(
                agg.day_record().unwrap(),
                DailyRecord {
                    date: "2024-03-02".to_string(),
                    value: 20.0
                }
            );
        }

        #[test]
        fn test_empty_totals_are_zero() {
            let agg = aggregator();
            assert_eq!(agg.month_total(day(2024, 3, 1)).unwrap(), 0.0);
            assert_eq!(agg.year_total(day(2024, 3, 1)).unwrap(), 0.0);
        }

        #[test]
        fn test_floor() {
            assert_eq!(floor(480.0, 500.0), 500.0);
            assert_eq!(floor(480.0, 460.0), 480.0);
        }

        #[test]
        fn test_update_applies_floors() {
            let agg = aggregator();
            agg.record_today(day(2024, 3, 1), 400.0).unwrap();

            let status = SolarStatus {
                power_now: 1_200.0,
                energy_today: 80.0,
                energy_month: 500.0,
                energy_year: 460.0,
                energy_total: 9_000.0,
            };
            let snapshot = agg.update(day(2024, 3, 2), &status).unwrap();

            // local month/year = 400 + 80 = 480
            assert_eq!(snapshot.energy_month, 500.0);
            assert_eq!(snapshot.energy_year, 480.0);
            assert_eq!(snapshot.power_now, 1_200.0);
            assert_eq!(snapshot.energy_today, 80.0);
            assert_eq!(snapshot.energy_total, 9_000.0);
            assert_eq!(
                snapshot.day_record,
                Some(DailyRecord {
                    date: "2024-03-01".to_string(),
                    value: 400.0
                })
            );
        }

        #[test]
        fn test_update_first_cycle_has_record() {
            let agg = aggregator();
            let status = SolarStatus {
                energy_today: 15.0,
                ..Default::default()
            };
            let snapshot = agg.update(day(2024, 3, 2), &status).unwrap();
            assert_eq!(snapshot.day_record.unwrap().date, "2024-03-02");
        }
    }

    mod fails {
        use super::*;

        #[test]
        fn test_non_finite_reading_is_rejected_and_recovers() {
            let agg = aggregator();
            let bad = SolarStatus {
                energy_today: f64::NAN,
                ..Default::default()
            };
            assert!(matches!(
                agg.update(day(2024, 3, 2), &bad),
                Err(StorageError::NonFinite { .. })
            ));
            assert!(matches!(
                agg.record_today(day(2024, 3, 2), f64::INFINITY),
                Err(StorageError::NonFinite { .. })
            ));
            assert_eq!(agg.store().record_count().unwrap(), 0);

            let good = SolarStatus {
                energy_today: 5_000.0,
                ..Default::default()
            };
            let snapshot = agg.update(day(2024, 3, 2), &good).unwrap();
            assert_eq!(snapshot.energy_month, 5_000.0);
            assert_eq!(snapshot.day_record.unwrap().value, 5_000.0);
        }

        #[test]
        fn test_day_record_on_empty_store() {
            let agg = aggregator();
            assert!(matches!(agg.day_record(), Err(StorageError::NotFound)));
        }
    }
}
