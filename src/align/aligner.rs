//! Places per-variable daily series onto the synthetic historical date axis.

use crate::align::historical_frame::HistoricalFrame;
use crate::error::GridcastError;
use crate::types::daily_series::DailySeries;
use crate::types::variable::Variable;
use crate::types::year_window::YearWindow;
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::HashMap;

/// Re-addresses one series by `(year_rank, day_offset)`.
///
/// The series must hold, in order, every day of the most recent span, then every
/// day of the span before it, and so on. Its own timestamps are not consulted.
fn keyed_values(
    window: &YearWindow,
    series: &DailySeries,
) -> Result<HashMap<NaiveDate, f64>, GridcastError> {
    let expected = window.axis_len();
    if series.len() != expected {
        return Err(GridcastError::Alignment {
            variable: series.variable(),
            expected,
            found: series.len(),
        });
    }

    let mut values = series.values().iter();
    let mut keyed = HashMap::with_capacity(expected);
    for span in window.spans() {
        for (day_offset, value) in values.by_ref().take(span.len()).enumerate() {
            if let Some(date) = window.date_at(span.year_rank, day_offset) {
                keyed.insert(date, value.value);
            }
        }
    }
    Ok(keyed)
}

/// Builds the historical frame: one row per axis date (most recent first) and one
/// column per variable.
///
/// A variable without a series gets an all-null column.
///
/// # Errors
///
/// [`GridcastError::Alignment`] if any series is shorter or longer than the axis.
pub fn align(window: &YearWindow, series: &[DailySeries]) -> Result<HistoricalFrame, GridcastError> {
    let axis = window.axis();

    let mut keyed: HashMap<Variable, HashMap<NaiveDate, f64>> = HashMap::new();
    for s in series {
        if keyed.insert(s.variable(), keyed_values(window, s)?).is_some() {
            warn!("More than one {} series supplied; the last one is used", s.variable());
        }
    }

    let columns = Variable::ALL.map(|variable| match keyed.get(&variable) {
        Some(values) => axis.iter().map(|date| values.get(date).copied()).collect(),
        None => vec![None; axis.len()],
    });

    info!(
        "Aligned {} series onto {} historical days over {} years",
        keyed.len(),
        axis.len(),
        window.number_of_years()
    );
    HistoricalFrame::from_columns(&axis, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::daily_series::DailyValue;
    use chrono::Datelike;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window() -> YearWindow {
        YearWindow::new(ymd(2024, 1, 1), ymd(2024, 1, 5), 5, 2014).unwrap()
    }

    /// Series in walk order whose value encodes (year, day).
    fn series(variable: Variable, len: usize) -> DailySeries {
        let values = (0..len)
            .map(|i| {
                let year = 2014 - (i / 5) as i32;
                let day = (i % 5) as u32 + 1;
                DailyValue {
                    date: ymd(year, 1, day),
                    value: (year * 100 + day as i32) as f64,
                }
            })
            .collect();
        DailySeries::new(variable, values)
    }

    #[test]
    fn aligns_every_variable_onto_25_rows() -> Result<(), Box<dyn std::error::Error>> {
        let all: Vec<DailySeries> = Variable::ALL.iter().map(|v| series(*v, 25)).collect();
        let frame = align(&window(), &all)?;

        assert_eq!(frame.height(), 25);
        let dates = frame.dates()?;
        assert_eq!(dates[0], ymd(2014, 1, 5));
        assert_eq!(dates[24], ymd(2010, 1, 1));

        for variable in Variable::ALL {
            let values = frame.values(variable)?;
            for (date, value) in dates.iter().zip(values) {
                let expected = (date.year() * 100 + date.day() as i32) as f64;
                assert_eq!(value, Some(expected));
            }
        }
        Ok(())
    }

    #[test]
    fn values_follow_keys_not_file_timestamps() -> Result<(), Box<dyn std::error::Error>> {
        // Timestamps from another year entirely; only the order matters.
        let values = (0..25)
            .map(|i| DailyValue {
                date: ymd(1999, 6, 1),
                value: i as f64,
            })
            .collect();
        let frame = align(&window(), &[DailySeries::new(Variable::Wind, values)])?;
        let dates = frame.dates()?;
        let wind = frame.values(Variable::Wind)?;
        let at = |date: NaiveDate| dates.iter().position(|d| *d == date).and_then(|i| wind[i]);

        assert_eq!(at(ymd(2014, 1, 1)), Some(0.0));
        assert_eq!(at(ymd(2014, 1, 5)), Some(4.0));
        assert_eq!(at(ymd(2013, 1, 1)), Some(5.0));
        assert_eq!(at(ymd(2010, 1, 5)), Some(24.0));
        assert!(frame.values(Variable::Humidity)?.iter().all(Option::is_none));
        Ok(())
    }

    #[test]
    fn short_series_is_an_alignment_error() {
        let mut all: Vec<DailySeries> = Variable::ALL.iter().map(|v| series(*v, 25)).collect();
        all[3] = series(Variable::Pressure, 24);
        match align(&window(), &all) {
            Err(GridcastError::Alignment {
                variable,
                expected,
                found,
            }) => {
                assert_eq!(variable, Variable::Pressure);
                assert_eq!(expected, 25);
                assert_eq!(found, 24);
            }
            other => panic!("expected Alignment, got {other:?}"),
        }
    }

    #[test]
    fn long_series_is_an_alignment_error() {
        let result = align(&window(), &[series(Variable::Temperature, 26)]);
        assert!(matches!(
            result,
            Err(GridcastError::Alignment { found: 26, .. })
        ));
    }
}
