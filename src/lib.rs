mod align;
mod config;
mod error;
mod forecast;
mod grid;
mod gridcast;
mod reduce;
mod synthetic;
mod types;

pub use error::GridcastError;
pub use gridcast::*;

pub use config::{ForecastConfig, GridSchema, DEFAULT_TIME_EPOCH};

pub use grid::error::DataFormatError;
pub use grid::extractor::GridSlice;
pub use grid::humidity::HumiditySlice;
#[cfg(feature = "netcdf")]
pub use grid::netcdf_source::NetcdfSource;
pub use grid::packing::decode_packed;
pub use grid::source::{GridFile, GridSource, GridSources, MemoryGrid};

pub use reduce::conversion::{
    record_relative_humidity, relative_humidity, KELVIN_OFFSET, KMH_PER_MS, PA_PER_HPA,
    RAIN_THRESHOLD_MM,
};
pub use reduce::reducer::{reduce_humidity, reduce_records};

pub use align::aligner::align;
pub use align::historical_frame::{HistoricalFrame, DATE_COLUMN};

pub use forecast::engine::ForecastEngine;
pub use forecast::forest::{ForestError, RandomForestRegressor};
pub use forecast::windows::{latest_window, TrainingPairs, LOOKBACK};

pub use types::bounding_box::{BoundingBox, DEFAULT_MARGIN_DEGREES};
pub use types::daily_series::{DailySeries, DailyValue};
pub use types::forecast_result::{ForecastDay, ForecastResult, VariableMeans};
pub use types::records::{GriddedRecord, HumidityRecord};
pub use types::request::{ForecastRequest, InputValidationError};
pub use types::variable::Variable;
pub use types::year_window::{DateSpan, YearWindow};

pub use synthetic::{
    air_quality_index, generate_synthetic_weather, CurrentWeather, SyntheticDay,
    SyntheticWeather, WeatherCondition,
};
