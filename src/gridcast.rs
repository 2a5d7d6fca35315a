//! The main entry point: gridded files in, forecast out.
//!
//! [`Gridcast`] composes the stages in order: extraction (per file), daily
//! reduction, alignment onto the historical axis, and the forecast. Each stage
//! consumes the previous stage's output whole; nothing partial is returned on error.

use crate::align::aligner::align;
use crate::align::historical_frame::HistoricalFrame;
use crate::config::ForecastConfig;
use crate::error::GridcastError;
use crate::forecast::engine::ForecastEngine;
use crate::grid::extractor::GridSlice;
use crate::grid::humidity::HumiditySlice;
use crate::grid::source::{GridSource, GridSources};
use crate::reduce::reducer::{reduce_humidity, reduce_records};
use crate::types::bounding_box::BoundingBox;
use crate::types::daily_series::DailySeries;
use crate::types::forecast_result::ForecastResult;
use crate::types::request::{ForecastRequest, InputValidationError};
use crate::types::variable::Variable;
use crate::types::year_window::YearWindow;
use bon::bon;
use log::info;

/// Forecasts the five daily variables for a requested date range from gridded
/// history of the same calendar window in past years.
///
/// # Examples
///
/// ```
/// use gridcast::{ForecastConfig, Gridcast};
///
/// let gridcast = Gridcast::with_config(ForecastConfig::builder().number_of_years(3).build());
/// assert_eq!(gridcast.config().number_of_years, 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Gridcast {
    config: ForecastConfig,
}

#[bon]
impl Gridcast {
    /// A pipeline with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Reads, reduces and aligns the gridded history for `request`.
    ///
    /// Every variable's files are read in the order given, which must be the order
    /// of the historical years (most recent first), days ascending inside each file.
    ///
    /// # Errors
    ///
    /// * [`GridcastError::InputValidation`] if the request window cannot be
    ///   replicated into past years or a variable has no files.
    /// * [`GridcastError::ExternalIo`] / [`GridcastError::DataFormat`] for the first
    ///   file that cannot be read.
    /// * [`GridcastError::Alignment`] if a variable's days do not cover the axis
    ///   exactly.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridcast::{ForecastRequest, GridSources, Gridcast, GridcastError, InputValidationError};
    ///
    /// let request = ForecastRequest::from_json(
    ///     r#"{"start_date": "2024-01-01", "end_date": "2024-01-02", "latitude": 4.6, "longitude": -74.1}"#,
    /// )?;
    /// let result = Gridcast::new()
    ///     .historical_frame()
    ///     .request(&request)
    ///     .sources(&GridSources::new())
    ///     .call();
    /// assert!(matches!(
    ///     result,
    ///     Err(GridcastError::InputValidation(InputValidationError::MissingSources(_)))
    /// ));
    /// # Ok::<(), GridcastError>(())
    /// ```
    #[builder]
    pub fn historical_frame(
        &self,
        request: &ForecastRequest,
        sources: &GridSources,
    ) -> Result<HistoricalFrame, GridcastError> {
        let window = YearWindow::new(
            request.start_date(),
            request.end_date(),
            self.config.number_of_years,
            self.config.max_year,
        )?;
        let bbox = BoundingBox::around(
            request.latitude(),
            request.longitude(),
            self.config.margin_degrees,
        );
        info!(
            "Building {}-day history over {} years around ({}, {})",
            window.axis_len(),
            window.number_of_years(),
            request.latitude(),
            request.longitude()
        );

        let series = Variable::ALL
            .iter()
            .map(|&variable| self.daily_series(variable, &bbox, sources.get(variable)))
            .collect::<Result<Vec<_>, _>>()?;

        align(&window, &series)
    }

    /// Runs the whole pipeline for `request`.
    ///
    /// # Errors
    ///
    /// Everything [`Gridcast::historical_frame`] returns, plus
    /// [`GridcastError::InsufficientHistory`] when the range is too long for the
    /// history.
    #[builder]
    pub fn forecast(
        &self,
        request: &ForecastRequest,
        sources: &GridSources,
    ) -> Result<ForecastResult, GridcastError> {
        let frame = self
            .historical_frame()
            .request(request)
            .sources(sources)
            .call()?;
        self.forecast_from_frame()
            .request(request)
            .frame(&frame)
            .call()
    }

    /// Forecasts `request` from an already aligned history, e.g. one loaded with
    /// [`HistoricalFrame::load_parquet`].
    #[builder]
    pub fn forecast_from_frame(
        &self,
        request: &ForecastRequest,
        frame: &HistoricalFrame,
    ) -> Result<ForecastResult, GridcastError> {
        let result =
            ForecastEngine::from_config(&self.config).forecast(frame, &request.dates())?;
        info!(
            "Forecast {} days from {} to {}",
            result.data.len(),
            request.start_date(),
            request.end_date()
        );
        Ok(result)
    }
}

impl Gridcast {
    /// Collects the records of every file in order, then reduces them together so a
    /// day split across files still yields one value.
    fn daily_series(
        &self,
        variable: Variable,
        bbox: &BoundingBox,
        sources: &[Box<dyn GridSource>],
    ) -> Result<DailySeries, GridcastError> {
        if sources.is_empty() {
            return Err(InputValidationError::MissingSources(variable).into());
        }
        let schema = &self.config.schema;

        let series = match schema.field_for(variable) {
            Some(field) => {
                let mut records = Vec::new();
                for source in sources {
                    let slice = GridSlice::extract(source.as_ref(), field, bbox, schema)?;
                    records.extend(slice.records());
                }
                reduce_records(variable, records)?
            }
            None => {
                let mut records = Vec::new();
                for source in sources {
                    let slice = HumiditySlice::extract(source.as_ref(), bbox, schema)?;
                    records.extend(slice.records());
                }
                reduce_humidity(records)?
            }
        };

        info!(
            "Reduced {} files of {} to {} days",
            sources.len(),
            variable,
            series.len()
        );
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::error::DataFormatError;
    use crate::grid::source::{GridFile, MemoryGrid};
    use chrono::NaiveDate;
    use ndarray::Array3;
    use std::io;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Jan 1 and Jan 2 of `year` on a 2x2 grid around Bogotá, each field constant.
    fn year_grid(year: i32, fields: &[(&str, f64)]) -> MemoryGrid {
        let epoch = ymd(1980, 1, 6);
        let offsets = (1..=2)
            .map(|day| (ymd(year, 1, day) - epoch).num_days() as f64)
            .collect();
        fields.iter().fold(
            MemoryGrid::new(format!("{}-{year}", fields[0].0))
                .with_axis("lat", vec![4.5, 4.75])
                .with_axis("lon", vec![-74.25, -74.0])
                .with_axis("time", offsets),
            |grid, (name, value)| {
                grid.with_field(*name, Array3::from_elem((2, 2, 2), *value).into_dyn())
            },
        )
    }

    fn sources(years: std::ops::RangeInclusive<i32>) -> GridSources {
        let mut sources = GridSources::new();
        for year in years.rev() {
            sources.push(Variable::Precipitation, year_grid(year, &[("precipitation", 1.0)]));
            sources.push(Variable::Wind, year_grid(year, &[("Wind_f_tavg", 2.5)]));
            sources.push(
                Variable::Humidity,
                year_grid(
                    year,
                    &[
                        ("Qair_f_tavg", 0.01),
                        ("Psurf_f_tavg", 100_000.0),
                        ("Tair_f_tavg", 293.15),
                    ],
                ),
            );
            sources.push(Variable::Pressure, year_grid(year, &[("Psurf_f_tavg", 75_230.0)]));
            sources.push(Variable::Temperature, year_grid(year, &[("T2MMEAN", 286.75)]));
        }
        sources
    }

    fn request() -> ForecastRequest {
        ForecastRequest::new(ymd(2024, 1, 1), ymd(2024, 1, 2), 4.6097, -74.0817).unwrap()
    }

    #[test]
    fn end_to_end_constant_history() -> Result<(), Box<dyn std::error::Error>> {
        let result = Gridcast::new()
            .forecast()
            .request(&request())
            .sources(&sources(2010..=2014))
            .call()?;

        let dates: Vec<NaiveDate> = result.data.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![ymd(2024, 1, 1), ymd(2024, 1, 2)]);
        for day in &result.data {
            assert_eq!(day.precipitation, 100);
            assert_eq!(day.wind, 9);
            assert_eq!(day.humidity, 68);
            assert_eq!(day.pressure, 752);
            assert_eq!(day.temperature, 14);
        }
        assert_eq!(result.means.humidity, 68);

        let json = result.to_json_pretty()?;
        assert!(json.contains("\"Temperatura (°C)\": 14"));
        Ok(())
    }

    #[test]
    fn historical_frame_spans_five_years() -> Result<(), Box<dyn std::error::Error>> {
        let frame = Gridcast::new()
            .historical_frame()
            .request(&request())
            .sources(&sources(2010..=2014))
            .call()?;
        assert_eq!(frame.height(), 10);
        let dates = frame.dates()?;
        assert_eq!(dates.first(), Some(&ymd(2014, 1, 2)));
        assert_eq!(dates.last(), Some(&ymd(2010, 1, 1)));
        Ok(())
    }

    #[test]
    fn missing_year_is_an_alignment_error() {
        let mut sources = sources(2011..=2014);
        sources.push(Variable::Precipitation, year_grid(2010, &[("precipitation", 1.0)]));
        let result = Gridcast::new()
            .historical_frame()
            .request(&request())
            .sources(&sources)
            .call();
        assert!(matches!(
            result,
            Err(GridcastError::Alignment {
                variable: Variable::Wind,
                expected: 10,
                found: 8
            })
        ));
    }

    #[test]
    fn variable_without_files_is_rejected() {
        let sources = GridSources::new()
            .with(Variable::Precipitation, year_grid(2014, &[("precipitation", 1.0)]));
        let result = Gridcast::new()
            .forecast()
            .request(&request())
            .sources(&sources)
            .call();
        assert!(matches!(
            result,
            Err(GridcastError::InputValidation(InputValidationError::MissingSources(
                Variable::Wind
            )))
        ));
    }

    #[derive(Debug)]
    struct Broken;

    impl GridSource for Broken {
        fn identity(&self) -> String {
            "GLDAS_NOAH025_3H.A20140101.nc4".to_string()
        }

        fn open(&self) -> io::Result<Box<dyn GridFile + '_>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn unreadable_file_is_reported_by_identity() {
        let mut sources = sources(2010..=2014);
        sources.push(Variable::Precipitation, Broken);
        let result = Gridcast::new()
            .forecast()
            .request(&request())
            .sources(&sources)
            .call();
        match result {
            Err(GridcastError::ExternalIo { file, .. }) => {
                assert_eq!(file, "GLDAS_NOAH025_3H.A20140101.nc4")
            }
            other => panic!("expected ExternalIo, got {other:?}"),
        }
    }

    #[test]
    fn wrong_field_name_is_a_format_error() {
        let config = ForecastConfig::builder()
            .schema(crate::config::GridSchema::builder().wind_field("WIND").build())
            .build();
        let result = Gridcast::with_config(config)
            .forecast()
            .request(&request())
            .sources(&sources(2010..=2014))
            .call();
        assert!(matches!(
            result,
            Err(GridcastError::DataFormat(DataFormatError::MissingVariable { .. }))
        ));
    }

    #[test]
    fn day_split_across_files_is_one_value() -> Result<(), GridcastError> {
        let half_day = |name: &str, offset: f64, kelvin: f64| {
            MemoryGrid::new(name)
                .with_axis("lat", vec![4.5, 4.75])
                .with_axis("lon", vec![-74.25, -74.0])
                .with_axis("time", vec![offset])
                .with_field("T2MMEAN", Array3::from_elem((1, 2, 2), kelvin).into_dyn())
        };
        let sources: Vec<Box<dyn GridSource>> = vec![
            Box::new(half_day("am", 12414.0, 280.0)),
            Box::new(half_day("pm", 12414.5, 290.0)),
        ];
        let bbox = BoundingBox::around(4.6097, -74.0817, 0.3);

        let series = Gridcast::new().daily_series(Variable::Temperature, &bbox, &sources)?;

        assert_eq!(series.len(), 1);
        let day = &series.values()[0];
        assert_eq!(day.date, ymd(2014, 1, 1));
        assert!((day.value - 11.85).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn leap_day_request_cannot_be_replicated() {
        let request = ForecastRequest::new(ymd(2024, 2, 29), ymd(2024, 3, 1), 4.6, -74.1).unwrap();
        let result = Gridcast::new()
            .forecast()
            .request(&request)
            .sources(&sources(2010..=2014))
            .call();
        assert!(matches!(
            result,
            Err(GridcastError::InputValidation(InputValidationError::DateMissingInYear { .. }))
        ));
    }
}
