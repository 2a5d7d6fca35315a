//! The structured forecast handed back to callers, and its JSON persistence.

use crate::error::GridcastError;
use crate::types::variable::Variable;
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Forecast values of the five variables for one requested day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    #[serde(rename = "Precipitacion (%)")]
    pub precipitation: i64,
    #[serde(rename = "Viento (km/h)")]
    pub wind: i64,
    #[serde(rename = "Humedad (%)")]
    pub humidity: i64,
    #[serde(rename = "PresionAtm (hPa)")]
    pub pressure: i64,
    #[serde(rename = "Temperatura (°C)")]
    pub temperature: i64,
}

impl ForecastDay {
    pub fn get(&self, variable: Variable) -> i64 {
        match variable {
            Variable::Precipitation => self.precipitation,
            Variable::Wind => self.wind,
            Variable::Humidity => self.humidity,
            Variable::Pressure => self.pressure,
            Variable::Temperature => self.temperature,
        }
    }
}

/// Per-variable means over the forecast days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMeans {
    #[serde(rename = "Precipitacion (%)")]
    pub precipitation: i64,
    #[serde(rename = "Viento (km/h)")]
    pub wind: i64,
    #[serde(rename = "Humedad (%)")]
    pub humidity: i64,
    #[serde(rename = "PresionAtm (hPa)")]
    pub pressure: i64,
    #[serde(rename = "Temperatura (°C)")]
    pub temperature: i64,
}

impl VariableMeans {
    pub fn get(&self, variable: Variable) -> i64 {
        match variable {
            Variable::Precipitation => self.precipitation,
            Variable::Wind => self.wind,
            Variable::Humidity => self.humidity,
            Variable::Pressure => self.pressure,
            Variable::Temperature => self.temperature,
        }
    }
}

/// Per-day predictions covering exactly the requested range, plus their means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub data: Vec<ForecastDay>,
    pub means: VariableMeans,
}

impl ForecastResult {
    /// Rounds raw predictions (one row of five values per date, in [`Variable::ALL`]
    /// order) and summarizes them. Rounding is half-to-even at every step.
    pub(crate) fn from_predictions(dates: &[NaiveDate], rows: &[[f64; 5]]) -> Self {
        let data: Vec<ForecastDay> = dates
            .iter()
            .zip(rows)
            .map(|(date, row)| ForecastDay {
                date: *date,
                precipitation: round_half_even(row[0]),
                wind: round_half_even(row[1]),
                humidity: round_half_even(row[2]),
                pressure: round_half_even(row[3]),
                temperature: round_half_even(row[4]),
            })
            .collect();

        let mean_of = |variable: Variable| -> i64 {
            if data.is_empty() {
                return 0;
            }
            let sum: f64 = data.iter().map(|d| d.get(variable) as f64).sum();
            round_half_even(sum / data.len() as f64)
        };

        let means = VariableMeans {
            precipitation: mean_of(Variable::Precipitation),
            wind: mean_of(Variable::Wind),
            humidity: mean_of(Variable::Humidity),
            pressure: mean_of(Variable::Pressure),
            temperature: mean_of(Variable::Temperature),
        };

        Self { data, means }
    }

    /// Pretty JSON with a four-space indent; non-ASCII characters are kept as is.
    pub fn to_json_pretty(&self) -> Result<String, GridcastError> {
        let mut buffer = Vec::new();
        self.write_pretty(&mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| GridcastError::Serialization(serde::ser::Error::custom(e)))
    }

    /// Writes the pretty JSON form to `path`, replacing any existing file.
    pub fn write_json(&self, path: &Path) -> Result<(), GridcastError> {
        let file =
            File::create(path).map_err(|e| GridcastError::ResultWrite(path.to_path_buf(), e))?;
        let mut writer = BufWriter::new(file);
        self.write_pretty(&mut writer)?;
        writer
            .flush()
            .map_err(|e| GridcastError::ResultWrite(path.to_path_buf(), e))?;
        info!("Wrote forecast for {} days to {:?}", self.data.len(), path);
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, GridcastError> {
        Ok(serde_json::from_str(json)?)
    }

    fn write_pretty<W: Write>(&self, writer: W) -> Result<(), GridcastError> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        self.serialize(&mut serializer)?;
        Ok(())
    }
}

pub(crate) fn round_half_even(value: f64) -> i64 {
    value.round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> ForecastResult {
        ForecastResult::from_predictions(
            &[ymd(2024, 1, 1), ymd(2024, 1, 2)],
            &[
                [12.4, 7.5, 80.2, 1012.6, 14.5],
                [20.6, 8.5, 79.9, 1013.4, 15.5],
            ],
        )
    }

    #[test]
    fn rounds_half_to_even() {
        let result = sample();
        assert_eq!(result.data[0].precipitation, 12);
        assert_eq!(result.data[0].wind, 8);
        assert_eq!(result.data[1].wind, 8);
        assert_eq!(result.data[0].temperature, 14);
        assert_eq!(result.data[1].temperature, 16);
        assert_eq!(result.data[1].pressure, 1013);
    }

    #[test]
    fn means_are_over_rounded_rows() {
        let result = sample();
        // (12 + 21) / 2 = 16.5 -> 16
        assert_eq!(result.means.precipitation, 16);
        assert_eq!(result.means.wind, 8);
        assert_eq!(result.means.humidity, 80);
        assert_eq!(result.means.pressure, 1013);
        assert_eq!(result.means.temperature, 15);
    }

    #[test]
    fn json_shape_uses_dates_and_variable_labels() -> Result<(), Box<dyn std::error::Error>> {
        let json = sample().to_json_pretty()?;
        assert!(json.contains("\"date\": \"2024-01-01\""));
        assert!(json.contains("\"Temperatura (°C)\": 14"));
        assert!(json.contains("\"means\""));
        assert!(json.contains("\n    \"data\""));

        let value: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(value["data"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["data"][1]["PresionAtm (hPa)"], 1013);
        assert_eq!(value["means"]["Viento (km/h)"], 8);
        Ok(())
    }

    #[test]
    fn json_keeps_non_ascii_labels_unescaped() -> Result<(), Box<dyn std::error::Error>> {
        let json = sample().to_json_pretty()?;
        assert!(!json.contains('\u{FFFD}'));
        assert!(!json.contains("\\u00b0"));
        assert_eq!(json.matches("°C").count(), 3);
        Ok(())
    }

    #[test]
    fn json_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let result = sample();
        let parsed = ForecastResult::from_json(&result.to_json_pretty()?)?;
        assert_eq!(parsed, result);
        Ok(())
    }

    #[test]
    fn write_json_to_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("resultados.json");
        let result = sample();
        result.write_json(&path)?;
        let written = std::fs::read_to_string(&path)?;
        assert_eq!(ForecastResult::from_json(&written)?, result);
        Ok(())
    }
}
