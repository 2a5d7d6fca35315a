//! Tunable constants of the pipeline. Defaults reproduce the reference datasets
//! (IMERG daily precipitation, GLDAS daily land forcing, MERRA-2 daily temperature).

use crate::types::bounding_box::DEFAULT_MARGIN_DEGREES;
use crate::types::variable::Variable;
use bon::Builder;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day zero of the integer `time` offsets in the gridded files.
pub const DEFAULT_TIME_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1980, 1, 6) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Names of axes and fields inside the gridded files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct GridSchema {
    #[builder(into, default = String::from("lat"))]
    pub latitude_axis: String,
    #[builder(into, default = String::from("lon"))]
    pub longitude_axis: String,
    #[builder(into, default = String::from("time"))]
    pub time_axis: String,
    #[builder(default = DEFAULT_TIME_EPOCH)]
    pub time_epoch: NaiveDate,

    #[builder(into, default = String::from("precipitation"))]
    pub precipitation_field: String,
    #[builder(into, default = String::from("Wind_f_tavg"))]
    pub wind_field: String,
    #[builder(into, default = String::from("Psurf_f_tavg"))]
    pub pressure_field: String,
    #[builder(into, default = String::from("T2MMEAN"))]
    pub temperature_field: String,

    /// Specific humidity (kg/kg) read for the humidity derivation.
    #[builder(into, default = String::from("Qair_f_tavg"))]
    pub specific_humidity_field: String,
    /// Surface pressure (Pa) read alongside specific humidity.
    #[builder(into, default = String::from("Psurf_f_tavg"))]
    pub humidity_pressure_field: String,
    /// Air temperature (K) read alongside specific humidity.
    #[builder(into, default = String::from("Tair_f_tavg"))]
    pub humidity_temperature_field: String,
}

impl Default for GridSchema {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GridSchema {
    /// Field read for a single-field variable. Humidity reads three fields and
    /// has no single one, so `None` is returned for it.
    pub fn field_for(&self, variable: Variable) -> Option<&str> {
        match variable {
            Variable::Precipitation => Some(&self.precipitation_field),
            Variable::Wind => Some(&self.wind_field),
            Variable::Pressure => Some(&self.pressure_field),
            Variable::Temperature => Some(&self.temperature_field),
            Variable::Humidity => None,
        }
    }
}

/// Settings for one [`crate::Gridcast`] instance.
///
/// # Examples
///
/// ```
/// use gridcast::ForecastConfig;
///
/// let config = ForecastConfig::builder().number_of_years(3).build();
/// assert_eq!(config.number_of_years, 3);
/// assert_eq!(config.max_year, 2014);
/// assert_eq!(config.n_estimators, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct ForecastConfig {
    /// Most recent historical year; windows walk backward from it.
    #[builder(default = 2014)]
    pub max_year: i32,
    /// How many past years are stacked into the historical axis.
    #[builder(default = 5)]
    pub number_of_years: usize,
    /// Half-width of the clip window around the requested point, in degrees.
    #[builder(default = DEFAULT_MARGIN_DEGREES)]
    pub margin_degrees: f64,
    /// Trees in the regression forest.
    #[builder(default = 200)]
    pub n_estimators: usize,
    /// Seed of the forest's bootstrap sampling.
    #[builder(default = 42)]
    pub seed: u64,
    #[builder(default)]
    pub schema: GridSchema,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
