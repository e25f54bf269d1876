use std::fmt;

/// Units a portal may report magnitudes in.
///
/// Power is normalized to watts and energy to watt-hours; `None` covers
/// bare numbers that portals already send in the base unit.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Unit {
    /// Watts (W) - instantaneous power
    Watt,
    /// Kilowatts (kW)
    Kilowatt,
    /// Watt-hours (Wh) - energy over time
    WattHour,
    /// Kilowatt-hours (kWh)
    KilowattHour,
    /// Megawatt-hours (MWh)
    MegawattHour,
    /// No unit suffix
    None,
}

impl Unit {
    /// Suffixes ordered longest first so "kWh" is never taken for "kW".
    pub const SUFFIXES: [Unit; 5] = [
        Unit::MegawattHour,
        Unit::KilowattHour,
        Unit::WattHour,
        Unit::Kilowatt,
        Unit::Watt,
    ];

    /// Factor bringing a magnitude in this unit to W or Wh.
    pub fn multiplier(self) -> f64 {
        match self {
            Unit::Watt | Unit::WattHour | Unit::None => 1.0,
            Unit::Kilowatt | Unit::KilowattHour => 1_000.0,
            Unit::MegawattHour => 1_000_000.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Unit::Watt => write!(f, "W"),
            Unit::Kilowatt => write!(f, "kW"),
            Unit::WattHour => write!(f, "Wh"),
            Unit::KilowattHour => write!(f, "kWh"),
            Unit::MegawattHour => write!(f, "MWh"),
            Unit::None => Ok(()),
        }
    }
}

/// Portal protocol a site is polled with.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ProviderKind {
    /// SEMS portal, current detail API
    Sems,
    /// SEMS portal, v1 detail API
    SemsLegacy,
    /// SolarEdge monitoring API
    SolarEdge,
    /// Omnik legacy web portal
    Omnik,
    /// Ginlong portal
    Ginlong,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProviderKind::Sems => write!(f, "sems"),
            ProviderKind::SemsLegacy => write!(f, "sems_legacy"),
            ProviderKind::SolarEdge => write!(f, "solaredge"),
            ProviderKind::Omnik => write!(f, "omnik"),
            ProviderKind::Ginlong => write!(f, "ginlong"),
        }
    }
}
