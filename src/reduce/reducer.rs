//! Collapses per-cell records into one scalar per calendar day.

use crate::error::GridcastError;
use crate::reduce::conversion::{convert, day_scale, qualifies, record_relative_humidity};
use crate::types::daily_series::{DailySeries, DailyValue};
use crate::types::records::{GriddedRecord, HumidityRecord};
use crate::types::variable::Variable;
use chrono::{Datelike, NaiveDate};
use log::debug;
use polars::prelude::*;

/// Reduces the records of one file (or several, concatenated) for `variable`.
///
/// | variable | conversion | day value |
/// |---|---|---|
/// | precipitation | rainy if > 0.1 mm | share of rainy cells × 100 |
/// | wind | m/s × 3.6 | mean over cells > 0 |
/// | pressure | Pa ÷ 100 | mean over cells > 0 |
/// | temperature | K − 273.15 | mean over all cells |
/// | humidity | already relative humidity | mean over cells > 0 |
///
/// Days keep the order they first appear in. A day without qualifying cells is
/// absent from the result. Non-finite cells are treated as missing; for
/// precipitation they count as dry.
pub fn reduce_records<I>(variable: Variable, records: I) -> Result<DailySeries, GridcastError>
where
    I: IntoIterator<Item = GriddedRecord>,
{
    let (days, values): (Vec<i32>, Vec<f64>) = records
        .into_iter()
        .filter_map(|record| {
            let value = match variable {
                Variable::Precipitation if !record.value.is_finite() => 0.0,
                _ if !record.value.is_finite() => return None,
                _ => record.value,
            };
            Some((day_key(record.date), value))
        })
        .unzip();
    reduce_cells(variable, days, values)
}

/// Derives relative humidity per cell and reduces it like any humidity series.
pub fn reduce_humidity<I>(records: I) -> Result<DailySeries, GridcastError>
where
    I: IntoIterator<Item = HumidityRecord>,
{
    let (days, values): (Vec<i32>, Vec<f64>) = records
        .into_iter()
        .map(|record| (day_key(record.date), record_relative_humidity(&record)))
        .filter(|(_, rh)| rh.is_finite())
        .unzip();
    reduce_cells(Variable::Humidity, days, values)
}

fn day_key(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

fn reduce_cells(
    variable: Variable,
    days: Vec<i32>,
    values: Vec<f64>,
) -> Result<DailySeries, GridcastError> {
    let cell_count = values.len();
    let cells = DataFrame::new(vec![
        Column::new("day".into(), days),
        Column::new("value".into(), values),
    ])?;

    let mut lazy = cells
        .lazy()
        .with_column(convert(variable, col("value")).alias("value"));
    if let Some(predicate) = qualifies(variable, col("value")) {
        lazy = lazy.filter(predicate);
    }
    let daily = lazy
        .group_by_stable([col("day")])
        .agg([(col("value").mean() * lit(day_scale(variable))).alias("value")])
        .collect()?;

    let days = daily.column("day")?.i32()?;
    let means = daily.column("value")?.f64()?;
    let values: Vec<DailyValue> = days
        .into_iter()
        .zip(means.into_iter())
        .filter_map(|(day, value)| {
            Some(DailyValue {
                date: NaiveDate::from_num_days_from_ce_opt(day?)?,
                value: value?,
            })
        })
        .collect();

    debug!(
        "Reduced {} {} cells to {} days",
        cell_count,
        variable,
        values.len()
    );
    Ok(DailySeries::new(variable, values))
}
