//! Defines the `Variable` tag carried alongside every gridded file reference and every
//! derived column of the historical frame.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five daily quantities the pipeline derives and forecasts.
///
/// Every gridded file handed to the pipeline is tagged with exactly one `Variable`,
/// which decides which field is read from it, how cells are converted and how a
/// day of cells collapses into a single scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    /// Share of rainy cells in the window, in percent.
    Precipitation,
    /// Mean wind speed in km/h.
    Wind,
    /// Mean relative humidity in percent, derived from specific humidity.
    Humidity,
    /// Mean surface pressure in hPa.
    Pressure,
    /// Mean air temperature in °C.
    Temperature,
}

impl Variable {
    /// All variables, in the column order of the historical frame and the forecast.
    pub const ALL: [Variable; 5] = [
        Variable::Precipitation,
        Variable::Wind,
        Variable::Humidity,
        Variable::Pressure,
        Variable::Temperature,
    ];

    /// Position of this variable in [`Variable::ALL`].
    pub fn index(self) -> usize {
        match self {
            Variable::Precipitation => 0,
            Variable::Wind => 1,
            Variable::Humidity => 2,
            Variable::Pressure => 3,
            Variable::Temperature => 4,
        }
    }

    /// Column label used in the historical frame and in the JSON result.
    pub fn column_name(self) -> &'static str {
        match self {
            Variable::Precipitation => "Precipitacion (%)",
            Variable::Wind => "Viento (km/h)",
            Variable::Humidity => "Humedad (%)",
            Variable::Pressure => "PresionAtm (hPa)",
            Variable::Temperature => "Temperatura (°C)",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Variable::Precipitation | Variable::Humidity => "%",
            Variable::Wind => "km/h",
            Variable::Pressure => "hPa",
            Variable::Temperature => "°C",
        }
    }

    pub(crate) fn column_names() -> Vec<&'static str> {
        Variable::ALL.iter().map(|v| v.column_name()).collect()
    }
}

/// Formats a `Variable` as its lowercase tag.
///
/// # Examples
///
/// ```
/// use gridcast::Variable;
///
/// assert_eq!(Variable::Humidity.to_string(), "humidity");
/// assert_eq!(format!("{}", Variable::Wind), "wind");
/// ```
impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Variable::Precipitation => "precipitation",
            Variable::Wind => "wind",
            Variable::Humidity => "humidity",
            Variable::Pressure => "pressure",
            Variable::Temperature => "temperature",
        };
        write!(f, "{}", tag)
    }
}
