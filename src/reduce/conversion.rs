//! Unit conversions and the relative-humidity derivation applied before cells are
//! collapsed into daily values.

use crate::types::records::HumidityRecord;
use crate::types::variable::Variable;
use polars::prelude::*;

/// A precipitation cell counts as rainy above this many millimetres.
pub const RAIN_THRESHOLD_MM: f64 = 0.1;
pub const KMH_PER_MS: f64 = 3.6;
pub const PA_PER_HPA: f64 = 100.0;
pub const KELVIN_OFFSET: f64 = 273.15;

/// Relative humidity in percent from specific humidity `q` (kg/kg), pressure `p`
/// (hPa) and air temperature `t` (°C), using the Magnus approximation.
///
/// # Examples
///
/// ```
/// use gridcast::relative_humidity;
///
/// let rh = relative_humidity(0.01, 1000.0, 20.0);
/// assert!((rh - 68.38).abs() < 0.01);
/// ```
pub fn relative_humidity(q: f64, p: f64, t: f64) -> f64 {
    let mixing_ratio = q / (1.0 - q);
    let vapor_pressure = (mixing_ratio * p) / (0.622 + mixing_ratio);
    let saturation_vapor_pressure = 6.112 * ((17.67 * t) / (t + 243.5)).exp();
    100.0 * vapor_pressure / saturation_vapor_pressure
}

/// Relative humidity of one raw record (Pa and K converted first).
pub fn record_relative_humidity(record: &HumidityRecord) -> f64 {
    relative_humidity(
        record.specific_humidity,
        record.surface_pressure / PA_PER_HPA,
        record.air_temperature - KELVIN_OFFSET,
    )
}

/// Converts a raw cell value into the unit the variable is reported in.
///
/// Precipitation becomes a 0/1 rain flag. Humidity values arrive already derived.
pub(crate) fn convert(variable: Variable, value: Expr) -> Expr {
    match variable {
        Variable::Precipitation => value
            .gt(lit(RAIN_THRESHOLD_MM))
            .cast(DataType::Float64),
        Variable::Wind => value * lit(KMH_PER_MS),
        Variable::Pressure => value / lit(PA_PER_HPA),
        Variable::Temperature => value - lit(KELVIN_OFFSET),
        Variable::Humidity => value,
    }
}

/// Cells a day's mean is taken over, after conversion.
pub(crate) fn qualifies(variable: Variable, value: Expr) -> Option<Expr> {
    match variable {
        Variable::Wind | Variable::Pressure | Variable::Humidity => Some(value.gt(lit(0.0))),
        Variable::Precipitation | Variable::Temperature => None,
    }
}

/// Scale applied to the day's mean.
pub(crate) fn day_scale(variable: Variable) -> f64 {
    match variable {
        Variable::Precipitation => 100.0,
        _ => 1.0,
    }
}
