//! The caller-facing request: a date range to forecast and the point to forecast it for.

use crate::types::variable::Variable;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq)]
pub enum InputValidationError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{field}' must be a number, got {value}")]
    NotANumber { field: &'static str, value: String },

    #[error("Field '{field}' must be a 'YYYY-MM-DD' date, got {value}")]
    MalformedDate { field: &'static str, value: String },

    #[error("{field} {value} is outside [{min}, {max}]")]
    CoordinateOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Date range {start}..{end} crosses a year boundary")]
    CrossYearWindow { start: NaiveDate, end: NaiveDate },

    #[error("{month:02}-{day:02} does not exist in {year}")]
    DateMissingInYear { month: u32, day: u32, year: i32 },

    #[error("At least one historical year is required")]
    NoHistoricalYears,

    #[error("No gridded files were supplied for {0}")]
    MissingSources(Variable),

    #[error("Request body is not a JSON object")]
    NotAnObject,

    #[error("Request body is not valid JSON: {0}")]
    InvalidJson(String),
}

/// A validated forecast request.
///
/// Construction goes through [`ForecastRequest::new`] or [`ForecastRequest::from_json`],
/// so an existing value always has `start_date <= end_date` and in-range coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRequest {
    start_date: NaiveDate,
    end_date: NaiveDate,
    latitude: f64,
    longitude: f64,
}

impl ForecastRequest {
    /// # Errors
    ///
    /// [`InputValidationError::EndBeforeStart`] or
    /// [`InputValidationError::CoordinateOutOfRange`].
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self, InputValidationError> {
        if end_date < start_date {
            return Err(InputValidationError::EndBeforeStart {
                start: start_date,
                end: end_date,
            });
        }
        check_range("latitude", latitude, 90.0)?;
        check_range("longitude", longitude, 180.0)?;
        Ok(Self {
            start_date,
            end_date,
            latitude,
            longitude,
        })
    }

    /// Parses the transport's JSON body, e.g.
    /// `{"start_date": "2024-01-01", "end_date": "2024-01-02", "latitude": 4.6097, "longitude": -74.0817}`.
    ///
    /// Coordinates may also be numeric strings.
    pub fn from_json(body: &str) -> Result<Self, InputValidationError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| InputValidationError::InvalidJson(e.to_string()))?;
        let object = value.as_object().ok_or(InputValidationError::NotAnObject)?;

        let field = |name: &'static str| {
            object
                .get(name)
                .filter(|v| !v.is_null())
                .ok_or(InputValidationError::MissingField(name))
        };

        let start_date = parse_date("start_date", field("start_date")?)?;
        let end_date = parse_date("end_date", field("end_date")?)?;
        let latitude = parse_number("latitude", field("latitude")?)?;
        let longitude = parse_number("longitude", field("longitude")?)?;

        Self::new(start_date, end_date, latitude, longitude)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Number of days to forecast, both ends inclusive.
    pub fn horizon(&self) -> usize {
        ((self.end_date - self.start_date).num_days() + 1) as usize
    }

    /// The requested dates in ascending order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|d| *d <= self.end_date)
            .collect()
    }
}

fn check_range(field: &'static str, value: f64, limit: f64) -> Result<(), InputValidationError> {
    if value.is_finite() && (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(InputValidationError::CoordinateOutOfRange {
            field,
            value,
            min: -limit,
            max: limit,
        })
    }
}

fn parse_date(field: &'static str, value: &Value) -> Result<NaiveDate, InputValidationError> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
        .ok_or_else(|| InputValidationError::MalformedDate {
            field,
            value: value.to_string(),
        })
}

fn parse_number(field: &'static str, value: &Value) -> Result<f64, InputValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| InputValidationError::NotANumber {
        field,
        value: value.to_string(),
    })
}
