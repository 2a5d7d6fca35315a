//! Clips one field of a gridded file to a bounding box and flattens it into
//! per-cell, per-day records.

use crate::config::GridSchema;
use crate::error::GridcastError;
use crate::grid::error::DataFormatError;
use crate::grid::source::{GridFile, GridSource};
use crate::types::bounding_box::BoundingBox;
use crate::types::records::GriddedRecord;
use chrono::{NaiveDate, TimeDelta};
use log::{debug, warn};
use ndarray::{Array3, Axis, Ix3};
use std::io;
use std::sync::Arc;

/// Axes of one open file after clipping to a bounding box.
#[derive(Debug, Clone)]
pub(crate) struct ClippedAxes {
    pub dates: Vec<NaiveDate>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    lat_indices: Vec<usize>,
    lon_indices: Vec<usize>,
    lat_len: usize,
    lon_len: usize,
}

pub(crate) fn io_error(identity: &str) -> impl FnOnce(io::Error) -> GridcastError + '_ {
    move |source| GridcastError::ExternalIo {
        file: identity.to_string(),
        source,
    }
}

fn read_axis(
    file: &dyn GridFile,
    identity: &str,
    axis: &str,
) -> Result<Vec<f64>, GridcastError> {
    file.read_axis(axis)
        .map_err(io_error(identity))?
        .ok_or_else(|| {
            DataFormatError::MissingAxis {
                file: identity.to_string(),
                axis: axis.to_string(),
            }
            .into()
        })
}

/// Maps day offsets onto calendar dates. Fractional offsets are truncated toward
/// zero.
fn offsets_to_dates(
    offsets: &[f64],
    epoch: NaiveDate,
    identity: &str,
) -> Result<Vec<NaiveDate>, DataFormatError> {
    offsets
        .iter()
        .map(|&offset| {
            let date = if offset.is_finite() {
                TimeDelta::try_days(offset.trunc() as i64)
                    .and_then(|delta| epoch.checked_add_signed(delta))
            } else {
                None
            };
            date.ok_or_else(|| DataFormatError::InvalidTimeOffset {
                file: identity.to_string(),
                offset,
            })
        })
        .collect()
}

/// Reads the three axes and selects the cells inside `bbox`.
pub(crate) fn clip_axes(
    file: &dyn GridFile,
    identity: &str,
    bbox: &BoundingBox,
    schema: &GridSchema,
) -> Result<ClippedAxes, GridcastError> {
    let latitudes = read_axis(file, identity, &schema.latitude_axis)?;
    let longitudes = read_axis(file, identity, &schema.longitude_axis)?;
    let offsets = read_axis(file, identity, &schema.time_axis)?;

    let dates = offsets_to_dates(&offsets, schema.time_epoch, identity)?;
    let lat_indices = bbox.latitude_indices(&latitudes);
    let lon_indices = bbox.longitude_indices(&longitudes);

    if lat_indices.is_empty() || lon_indices.is_empty() {
        warn!(
            "No grid cells of '{}' fall inside {:?}; it contributes no records",
            identity, bbox
        );
    }

    Ok(ClippedAxes {
        latitudes: lat_indices.iter().map(|&i| latitudes[i]).collect(),
        longitudes: lon_indices.iter().map(|&i| longitudes[i]).collect(),
        lat_len: latitudes.len(),
        lon_len: longitudes.len(),
        dates,
        lat_indices,
        lon_indices,
    })
}

/// Reads `name` as a (time, lat, lon) cube and keeps the clipped cells.
///
/// A two-dimensional field is treated as a single time step.
pub(crate) fn clip_field(
    file: &dyn GridFile,
    identity: &str,
    name: &str,
    axes: &ClippedAxes,
) -> Result<Array3<f64>, GridcastError> {
    let field = file
        .read_field(name)
        .map_err(io_error(identity))?
        .ok_or_else(|| DataFormatError::MissingVariable {
            file: identity.to_string(),
            variable: name.to_string(),
        })?;

    let rank = field.ndim();
    let unexpected_rank = || DataFormatError::UnexpectedRank {
        file: identity.to_string(),
        variable: name.to_string(),
        found: rank,
    };
    let cube = match rank {
        2 => field.insert_axis(Axis(0)).into_dimensionality::<Ix3>(),
        3 => field.into_dimensionality::<Ix3>(),
        _ => return Err(unexpected_rank().into()),
    }
    .map_err(|_| unexpected_rank())?;

    let expected = [axes.dates.len(), axes.lat_len, axes.lon_len];
    if cube.shape() != expected.as_slice() {
        return Err(DataFormatError::ShapeMismatch {
            file: identity.to_string(),
            variable: name.to_string(),
            shape: cube.shape().to_vec(),
            time: expected[0],
            lat: expected[1],
            lon: expected[2],
        }
        .into());
    }

    Ok(cube
        .select(Axis(1), &axes.lat_indices)
        .select(Axis(2), &axes.lon_indices))
}

/// One field of one file, clipped to a bounding box.
///
/// The file is closed by the time a `GridSlice` exists; [`GridSlice::records`]
/// flattens it lazily.
#[derive(Debug, Clone)]
pub struct GridSlice {
    field: Arc<str>,
    dates: Vec<NaiveDate>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    values: Array3<f64>,
}

impl GridSlice {
    /// Opens `source`, clips `field` to `bbox` and closes the file again, on error
    /// paths too.
    ///
    /// # Errors
    ///
    /// [`GridcastError::ExternalIo`] if the file cannot be opened or read, and
    /// [`GridcastError::DataFormat`] if the field or an axis is missing or the
    /// field's shape does not match the axes.
    pub fn extract(
        source: &dyn GridSource,
        field: &str,
        bbox: &BoundingBox,
        schema: &GridSchema,
    ) -> Result<Self, GridcastError> {
        let identity = source.identity();
        let file = source.open().map_err(io_error(&identity))?;
        let axes = clip_axes(file.as_ref(), &identity, bbox, schema)?;
        let values = clip_field(file.as_ref(), &identity, field, &axes)?;
        drop(file);

        debug!(
            "Clipped '{}' from '{}' to {} days x {} x {} cells",
            field,
            identity,
            axes.dates.len(),
            axes.latitudes.len(),
            axes.longitudes.len()
        );

        Ok(Self {
            field: Arc::from(field),
            dates: axes.dates,
            latitudes: axes.latitudes,
            longitudes: axes.longitudes,
            values,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Dates of the file's time steps, in file order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// The clipped (time, lat, lon) cube.
    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    /// Number of records [`GridSlice::records`] yields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// One record per (day, lat, lon) cell, day-major.
    pub fn records(&self) -> impl Iterator<Item = GriddedRecord> + '_ {
        self.values
            .indexed_iter()
            .map(move |((t, i, j), &value)| GriddedRecord {
                date: self.dates[t],
                field: Arc::clone(&self.field),
                latitude: self.latitudes[i],
                longitude: self.longitudes[j],
                value,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::source::MemoryGrid;
    use ndarray::{Array2, Array3};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Two days on a 3x3 grid; the value encodes (day, lat index, lon index).
    fn grid() -> MemoryGrid {
        let values = Array3::from_shape_fn((2, 3, 3), |(t, i, j)| {
            (t * 100 + i * 10 + j) as f64
        });
        MemoryGrid::new("wind-2014.nc4")
            .with_axis("lat", vec![4.0, 4.5, 5.0])
            .with_axis("lon", vec![-74.5, -74.0, -73.5])
            .with_axis("time", vec![12414.0, 12415.0])
            .with_field("Wind_f_tavg", values.into_dyn())
    }

    #[test]
    fn clips_to_inclusive_box_and_maps_dates() -> Result<(), Box<dyn std::error::Error>> {
        let bbox = BoundingBox {
            west: -74.0,
            south: 4.5,
            east: -73.5,
            north: 5.0,
        };
        let slice = GridSlice::extract(&grid(), "Wind_f_tavg", &bbox, &GridSchema::default())?;

        assert_eq!(slice.latitudes(), &[4.5, 5.0]);
        assert_eq!(slice.longitudes(), &[-74.0, -73.5]);
        // 1980-01-06 + 12414 days
        assert_eq!(slice.dates(), &[ymd(2014, 1, 1), ymd(2014, 1, 2)]);

        let records: Vec<GriddedRecord> = slice.records().collect();
        assert_eq!(records.len(), 8);
        assert_eq!(records[0].value, 11.0);
        assert_eq!(records[0].latitude, 4.5);
        assert_eq!(records[0].longitude, -74.0);
        assert_eq!(records[7].value, 122.0);
        assert_eq!(records[7].date, ymd(2014, 1, 2));
        assert_eq!(&*records[3].field, "Wind_f_tavg");
        Ok(())
    }

    #[test]
    fn two_dimensional_field_is_one_day() -> Result<(), Box<dyn std::error::Error>> {
        let grid = MemoryGrid::new("t2m")
            .with_axis("lat", vec![0.0, 1.0])
            .with_axis("lon", vec![0.0, 1.0])
            .with_axis("time", vec![0.0])
            .with_field("T2MMEAN", Array2::from_elem((2, 2), 290.0).into_dyn());
        let bbox = BoundingBox::around(0.0, 0.0, 0.3);
        let slice = GridSlice::extract(&grid, "T2MMEAN", &bbox, &GridSchema::default())?;
        assert_eq!(slice.len(), 1);
        assert_eq!(slice.dates(), &[ymd(1980, 1, 6)]);
        Ok(())
    }

    #[test]
    fn empty_time_axis_yields_no_records() -> Result<(), Box<dyn std::error::Error>> {
        let grid = MemoryGrid::new("empty")
            .with_axis("lat", vec![0.0])
            .with_axis("lon", vec![0.0])
            .with_axis("time", vec![])
            .with_field("precipitation", Array3::<f64>::zeros((0, 1, 1)).into_dyn());
        let bbox = BoundingBox::around(0.0, 0.0, 0.3);
        let slice = GridSlice::extract(&grid, "precipitation", &bbox, &GridSchema::default())?;
        assert!(slice.is_empty());
        assert_eq!(slice.records().count(), 0);
        Ok(())
    }

    #[test]
    fn missing_field_or_axis_is_a_format_error() {
        let bbox = BoundingBox::around(4.5, -74.0, 0.3);
        let schema = GridSchema::default();

        let result = GridSlice::extract(&grid(), "T2MMEAN", &bbox, &schema);
        assert!(matches!(
            result,
            Err(GridcastError::DataFormat(DataFormatError::MissingVariable { .. }))
        ));

        let no_time = MemoryGrid::new("no-time")
            .with_axis("lat", vec![4.5])
            .with_axis("lon", vec![-74.0])
            .with_field("Wind_f_tavg", Array3::<f64>::zeros((1, 1, 1)).into_dyn());
        let result = GridSlice::extract(&no_time, "Wind_f_tavg", &bbox, &schema);
        assert!(matches!(
            result,
            Err(GridcastError::DataFormat(DataFormatError::MissingAxis { ref axis, .. })) if axis == "time"
        ));
    }

    #[test]
    fn shape_must_match_axes() {
        let grid = MemoryGrid::new("bad-shape")
            .with_axis("lat", vec![0.0, 1.0])
            .with_axis("lon", vec![0.0])
            .with_axis("time", vec![0.0, 1.0])
            .with_field("Wind_f_tavg", Array3::<f64>::zeros((1, 2, 1)).into_dyn());
        let bbox = BoundingBox::around(0.0, 0.0, 0.3);
        let result = GridSlice::extract(&grid, "Wind_f_tavg", &bbox, &GridSchema::default());
        assert!(matches!(
            result,
            Err(GridcastError::DataFormat(DataFormatError::ShapeMismatch { time: 2, .. }))
        ));
    }

    #[test]
    fn non_finite_time_offset_is_rejected() {
        let grid = MemoryGrid::new("nan-time")
            .with_axis("lat", vec![0.0])
            .with_axis("lon", vec![0.0])
            .with_axis("time", vec![f64::NAN])
            .with_field("Wind_f_tavg", Array3::<f64>::zeros((1, 1, 1)).into_dyn());
        let bbox = BoundingBox::around(0.0, 0.0, 0.3);
        let result = GridSlice::extract(&grid, "Wind_f_tavg", &bbox, &GridSchema::default());
        assert!(matches!(
            result,
            Err(GridcastError::DataFormat(DataFormatError::InvalidTimeOffset { .. }))
        ));
    }

    #[derive(Debug)]
    struct Unreadable;

    impl GridSource for Unreadable {
        fn identity(&self) -> String {
            "s3://bucket/missing.nc4".to_string()
        }

        fn open(&self) -> io::Result<Box<dyn GridFile + '_>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such object"))
        }
    }

    #[test]
    fn open_failure_carries_file_identity() {
        let bbox = BoundingBox::around(0.0, 0.0, 0.3);
        let result = GridSlice::extract(&Unreadable, "precipitation", &bbox, &GridSchema::default());
        match result {
            Err(GridcastError::ExternalIo { file, source }) => {
                assert_eq!(file, "s3://bucket/missing.nc4");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected ExternalIo, got {other:?}"),
        }
    }
}
