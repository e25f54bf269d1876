//! Conversion of portal magnitudes into watts and watt-hours.

use crate::error::FormatError;

use super::types::Unit;

/// Brings a magnitude expressed in `unit` to the base unit (W or Wh).
pub fn normalize(value: f64, unit: Unit) -> f64 {
    value * unit.multiplier()
}

/// Shorthand for the common kW / kWh to W / Wh conversion.
pub fn from_kilo(value: f64) -> f64 {
    normalize(value, Unit::KilowattHour)
}

/// Splits a string such as `"12.3 kWh"` into its number and unit.
///
/// The longest matching suffix wins; a string without a recognised suffix
/// is treated as a bare number in the base unit.
pub fn split_magnitude(raw: &str) -> Result<(f64, Unit), FormatError> {
    let trimmed = raw.trim();
    let (number, unit) = Unit::SUFFIXES
        .iter()
        .find_map(|unit| {
            trimmed
                .strip_suffix(unit.to_string().as_str())
                .map(|rest| (rest.trim_end(), *unit))
        })
        .unwrap_or((trimmed, Unit::None));

    if number.is_empty() {
        return Err(FormatError::NoNumber(raw.to_string()));
    }
    let value = number
        .parse::<f64>()
        .map_err(|e| FormatError::invalid_number(raw, e))?;
    if !value.is_finite() {
        return Err(FormatError::invalid_number(raw, "not a finite number"));
    }
    Ok((value, unit))
}

/// Parses a string-encoded magnitude straight into W or Wh.
pub fn parse_magnitude(raw: &str) -> Result<f64, FormatError> {
    let (value, unit) = split_magnitude(raw)?;
    Ok(normalize(value, unit))
}
