//! Randomized weather for a location and date range, with no real data behind it.
//!
//! Values follow a weekly sine around latitude-dependent baselines, scaled by one
//! random factor per day and clamped to plausible ranges. The forecast pipeline
//! never calls this; it backs previews and demos that need weather-shaped data.

use crate::types::request::ForecastRequest;
use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;

/// Sky condition derived from temperature and humidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WeatherCondition {
    Sunny,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    Cloudy,
    Overcast,
    #[serde(rename = "Cloudy & Sunny")]
    CloudyAndSunny,
}

impl WeatherCondition {
    /// First matching rule wins: hot and dry is sunny, warm and fairly dry is partly
    /// cloudy, humid is cloudy, cold is overcast.
    pub fn classify(temperature: f64, humidity: f64) -> Self {
        if temperature > 30.0 && humidity < 40.0 {
            Self::Sunny
        } else if temperature > 25.0 && humidity < 60.0 {
            Self::PartlyCloudy
        } else if humidity > 70.0 {
            Self::Cloudy
        } else if temperature < 15.0 {
            Self::Overcast
        } else {
            Self::CloudyAndSunny
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Sunny => "Sunny",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Overcast => "Overcast",
            Self::CloudyAndSunny => "Cloudy & Sunny",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticDay {
    pub date: NaiveDate,
    /// °C, within [-10, 45].
    pub temperature: f64,
    /// %, within [10, 100].
    pub humidity: f64,
    /// hPa, within [950, 1050].
    pub pressure: f64,
    /// km/h, within [0, 50].
    pub wind_speed: f64,
    /// Within [0, 15].
    pub uv_index: f64,
    /// Within [0, 100].
    pub air_quality: i64,
    pub condition: WeatherCondition,
}

/// Averages over the generated days and their most frequent condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub condition: WeatherCondition,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub uv_index: f64,
    pub air_quality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticWeather {
    pub current_weather: CurrentWeather,
    pub forecast: Vec<SyntheticDay>,
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Simplified 0-100 air-quality index: low pressure, high humidity, calm wind and
/// strong UV all raise it.
pub fn air_quality_index(pressure: f64, humidity: f64, wind_speed: f64, uv_index: f64) -> i64 {
    let pressure_factor = ((1013.0 - pressure) / 100.0).max(0.0);
    let humidity_factor = ((humidity - 50.0) / 50.0).max(0.0);
    let wind_factor = ((10.0 - wind_speed) / 10.0).max(0.0);
    let uv_factor = uv_index / 15.0;

    let aqi = 20.0
        + pressure_factor * 20.0
        + humidity_factor * 15.0
        + wind_factor * 25.0
        + uv_factor * 20.0;
    (aqi.round_ties_even() as i64).clamp(0, 100)
}

fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round_ties_even() / scale
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Generates one day per date of `request`, drawing the daily random factor from
/// `rng`.
///
/// # Examples
///
/// ```
/// use gridcast::{generate_synthetic_weather, ForecastRequest};
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let request = ForecastRequest::from_json(
///     r#"{"start_date": "2025-10-05", "end_date": "2025-10-11", "latitude": -17.78, "longitude": -63.18}"#,
/// )?;
/// let weather = generate_synthetic_weather(&request, &mut StdRng::seed_from_u64(7));
/// assert_eq!(weather.forecast.len(), 7);
/// # Ok::<(), gridcast::InputValidationError>(())
/// ```
pub fn generate_synthetic_weather<R: Rng + ?Sized>(
    request: &ForecastRequest,
    rng: &mut R,
) -> SyntheticWeather {
    let lat_factor = request.latitude().abs() / 90.0;

    let base_temperature = 25.0 + lat_factor * 15.0 - lat_factor * 20.0;
    let base_humidity = 50.0 + lat_factor * 30.0;
    let base_pressure = 1013.0 + lat_factor * 50.0;
    let base_wind = 5.0 + lat_factor * 10.0;
    let base_uv = 3.0 + lat_factor * 8.0;

    let forecast: Vec<SyntheticDay> = request
        .dates()
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let weekly = (i as f64 * 2.0 * PI / 7.0).sin();
            let jitter = rng.gen_range(0.8..=1.2) - 1.0;

            let temperature =
                round_to(base_temperature + weekly * 5.0 + jitter * 10.0, 1).clamp(-10.0, 45.0);
            let humidity =
                round_to(base_humidity + weekly * 10.0 + jitter * 20.0, 1).clamp(10.0, 100.0);
            let pressure =
                round_to(base_pressure + weekly * 20.0 + jitter * 30.0, 0).clamp(950.0, 1050.0);
            let wind_speed = round_to(base_wind + weekly * 3.0 + jitter * 5.0, 1).clamp(0.0, 50.0);
            let uv_index = round_to(base_uv + weekly * 2.0 + jitter * 3.0, 1).clamp(0.0, 15.0);

            SyntheticDay {
                date,
                temperature,
                humidity,
                pressure,
                wind_speed,
                uv_index,
                air_quality: air_quality_index(pressure, humidity, wind_speed, uv_index),
                condition: WeatherCondition::classify(temperature, humidity),
            }
        })
        .collect();

    let current_weather = CurrentWeather {
        temperature: round_to(mean(forecast.iter().map(|d| d.temperature)), 1),
        condition: most_common_condition(&forecast),
        humidity: round_to(mean(forecast.iter().map(|d| d.humidity)), 1),
        pressure: round_to(mean(forecast.iter().map(|d| d.pressure)), 0),
        wind_speed: round_to(mean(forecast.iter().map(|d| d.wind_speed)), 1),
        uv_index: round_to(mean(forecast.iter().map(|d| d.uv_index)), 1),
        air_quality: round_to(mean(forecast.iter().map(|d| d.air_quality as f64)), 0),
    };

    SyntheticWeather {
        current_weather,
        forecast,
        latitude: request.latitude(),
        longitude: request.longitude(),
        start_date: request.start_date(),
        end_date: request.end_date(),
    }
}

/// Most frequent condition; ties go to the one seen first.
fn most_common_condition(days: &[SyntheticDay]) -> WeatherCondition {
    let mut counts: Vec<(WeatherCondition, usize)> = Vec::new();
    for day in days {
        match counts.iter_mut().find(|(c, _)| *c == day.condition) {
            Some((_, count)) => *count += 1,
            None => counts.push((day.condition, 1)),
        }
    }
    counts
        .iter()
        .fold(None, |best: Option<(WeatherCondition, usize)>, &(c, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((c, n)),
        })
        .map_or(WeatherCondition::CloudyAndSunny, |(c, _)| c)
}
