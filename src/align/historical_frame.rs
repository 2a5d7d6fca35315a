//! The aligned history the forecast is trained on.

use crate::error::GridcastError;
use crate::grid::error::DataFormatError;
use crate::types::variable::Variable;
use chrono::{Datelike, NaiveDate};
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Name of the row-key column.
pub const DATE_COLUMN: &str = "date";

/// Days between 0001-01-01 and the Unix epoch, which Polars dates count from.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A Polars `DataFrame` with a `date` column followed by one `f64` column per
/// [`Variable`], labelled with [`Variable::column_name`].
///
/// Rows are in historical-axis order (most recent year first). Cells are null where
/// a variable had no value for that day.
#[derive(Debug, Clone)]
pub struct HistoricalFrame {
    frame: DataFrame,
}

impl HistoricalFrame {
    /// Builds the frame from a date axis and, per variable in [`Variable::ALL`]
    /// order, one optional value per axis date.
    pub fn from_columns(
        dates: &[NaiveDate],
        columns: [Vec<Option<f64>>; 5],
    ) -> Result<Self, GridcastError> {
        let days: Vec<i32> = dates
            .iter()
            .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect();
        let mut frame_columns =
            vec![Column::new(DATE_COLUMN.into(), days).cast(&DataType::Date)?];
        for (variable, values) in Variable::ALL.iter().zip(columns) {
            frame_columns.push(Column::new(variable.column_name().into(), values));
        }
        Ok(Self {
            frame: DataFrame::new(frame_columns)?,
        })
    }

    /// Builds a complete frame from `(date, values)` rows.
    pub fn from_rows(rows: &[(NaiveDate, [f64; 5])]) -> Result<Self, GridcastError> {
        let dates: Vec<NaiveDate> = rows.iter().map(|(date, _)| *date).collect();
        let columns = std::array::from_fn(|i| rows.iter().map(|(_, v)| Some(v[i])).collect());
        Self::from_columns(&dates, columns)
    }

    /// Wraps an existing frame, e.g. one loaded from elsewhere.
    ///
    /// # Errors
    ///
    /// [`DataFormatError::MissingColumn`] if the date column or a variable column is
    /// absent. Columns are cast to `Date` and `f64`; extra columns are dropped.
    pub fn from_dataframe(frame: DataFrame) -> Result<Self, GridcastError> {
        let mut columns = Vec::with_capacity(Variable::ALL.len() + 1);
        for name in std::iter::once(DATE_COLUMN).chain(Variable::column_names()) {
            let column = frame
                .column(name)
                .map_err(|_| DataFormatError::MissingColumn(name.to_string()))?;
            let dtype = if name == DATE_COLUMN {
                DataType::Date
            } else {
                DataType::Float64
            };
            columns.push(column.cast(&dtype)?);
        }
        Ok(Self {
            frame: DataFrame::new(columns)?,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_dataframe(self) -> DataFrame {
        self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Row keys in frame order.
    pub fn dates(&self) -> Result<Vec<NaiveDate>, GridcastError> {
        let dates = self.frame.column(DATE_COLUMN)?.date()?;
        dates
            .into_iter()
            .map(|day| {
                day.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE))
                    .ok_or_else(|| {
                        GridcastError::from(DataFormatError::MissingValues(DATE_COLUMN.to_string()))
                    })
            })
            .collect()
    }

    /// Values of one variable in frame order.
    pub fn values(&self, variable: Variable) -> Result<Vec<Option<f64>>, GridcastError> {
        let values = self.frame.column(variable.column_name())?.f64()?;
        Ok(values.into_iter().collect())
    }

    /// Complete rows sorted by ascending date, values in [`Variable::ALL`] order.
    ///
    /// # Errors
    ///
    /// [`DataFormatError::MissingValues`] naming the first column with a null or
    /// NaN cell.
    pub fn ascending_rows(&self) -> Result<Vec<(NaiveDate, [f64; 5])>, GridcastError> {
        let dates = self.dates()?;
        let mut rows: Vec<(NaiveDate, [f64; 5])> =
            dates.into_iter().map(|date| (date, [0.0; 5])).collect();

        for variable in Variable::ALL {
            for (row, value) in rows.iter_mut().zip(self.values(variable)?) {
                row.1[variable.index()] = value
                    .filter(|v| !v.is_nan())
                    .ok_or_else(|| DataFormatError::MissingValues(variable.column_name().to_string()))?;
            }
        }

        rows.sort_by_key(|(date, _)| *date);
        Ok(rows)
    }

    /// Writes the frame to a Parquet file.
    pub fn save_parquet(&self, path: &Path) -> Result<(), GridcastError> {
        let file = File::create(path).map_err(|e| GridcastError::FrameFile(path.to_path_buf(), e))?;
        let mut frame = self.frame.clone();
        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut frame)?;
        info!("Saved historical frame ({} rows) to {:?}", self.height(), path);
        Ok(())
    }

    /// Reads a frame written by [`HistoricalFrame::save_parquet`].
    pub fn load_parquet(path: &Path) -> Result<Self, GridcastError> {
        let file = File::open(path).map_err(|e| GridcastError::FrameFile(path.to_path_buf(), e))?;
        let frame = ParquetReader::new(file).finish()?;
        Self::from_dataframe(frame)
    }
}
