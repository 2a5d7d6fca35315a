//! Trains on the aligned history and predicts the requested days in one block.

use crate::align::historical_frame::HistoricalFrame;
use crate::config::ForecastConfig;
use crate::error::GridcastError;
use crate::forecast::forest::RandomForestRegressor;
use crate::forecast::windows::{latest_window, TrainingPairs, LOOKBACK};
use crate::types::forecast_result::ForecastResult;
use crate::types::variable::Variable;
use chrono::NaiveDate;
use log::info;
use ndarray::Array1;

/// Forest settings for one forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastEngine {
    pub n_estimators: usize,
    pub seed: u64,
}

impl ForecastEngine {
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            seed: config.seed,
        }
    }

    /// Forecasts one row per entry of `dates` from the history in `frame`.
    ///
    /// The frame is sorted by ascending date and every row `i` with [`LOOKBACK`] rows
    /// before it and `dates.len()` rows from it becomes one training pair. The forest
    /// then predicts from the last [`LOOKBACK`] rows. Values are rounded half to
    /// even and labelled with `dates` as given.
    ///
    /// # Errors
    ///
    /// [`GridcastError::InsufficientHistory`] if no training pair fits, and
    /// [`GridcastError::DataFormat`] if the frame has missing values.
    pub fn forecast(
        &self,
        frame: &HistoricalFrame,
        dates: &[NaiveDate],
    ) -> Result<ForecastResult, GridcastError> {
        let horizon = dates.len();
        if horizon == 0 {
            return Ok(ForecastResult::from_predictions(&[], &[]));
        }

        let rows: Vec<[f64; 5]> = frame
            .ascending_rows()?
            .into_iter()
            .map(|(_, values)| values)
            .collect();

        let pairs = TrainingPairs::build(&rows, LOOKBACK, horizon);
        if pairs.is_empty() {
            return Err(GridcastError::InsufficientHistory {
                rows: rows.len(),
                lookback: LOOKBACK,
                horizon,
            });
        }
        info!(
            "Training on {} pairs from {} historical days for a {}-day horizon",
            pairs.len(),
            rows.len(),
            horizon
        );

        let forest = RandomForestRegressor::fit(
            pairs.features.view(),
            pairs.targets.view(),
            self.n_estimators,
            self.seed,
        )?;
        let latest = Array1::from(latest_window(&rows, LOOKBACK));
        let prediction = forest.predict(latest.view())?;

        let width = Variable::ALL.len();
        let predicted: Vec<[f64; 5]> = prediction
            .to_vec()
            .chunks_exact(width)
            .map(|day| std::array::from_fn(|k| day[k]))
            .collect();

        Ok(ForecastResult::from_predictions(dates, &predicted))
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::from_config(&ForecastConfig::default())
    }
}
