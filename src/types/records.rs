use chrono::NaiveDate;
use std::sync::Arc;

/// One observation at one grid cell on one day, for one source field.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedRecord {
    pub date: NaiveDate,
    /// Name of the source field, shared by every record of one extraction.
    pub field: Arc<str>,
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

/// The three raw fields the humidity derivation needs, for one cell on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct HumidityRecord {
    pub date: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    /// Specific humidity, kg/kg.
    pub specific_humidity: f64,
    /// Surface pressure, Pa.
    pub surface_pressure: f64,
    /// Air temperature, K.
    pub air_temperature: f64,
}
