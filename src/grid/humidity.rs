//! Reads the three co-located fields relative humidity is derived from.
//!
//! Only extraction happens here; the physical derivation lives in
//! [`crate::reduce::conversion::relative_humidity`].

use crate::config::GridSchema;
use crate::error::GridcastError;
use crate::grid::extractor::{clip_axes, clip_field, io_error};
use crate::grid::source::GridSource;
use crate::types::bounding_box::BoundingBox;
use crate::types::records::HumidityRecord;
use chrono::NaiveDate;
use log::debug;
use ndarray::Array3;

/// Specific humidity, surface pressure and air temperature of one file, clipped to
/// a bounding box.
#[derive(Debug, Clone)]
pub struct HumiditySlice {
    dates: Vec<NaiveDate>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    specific_humidity: Array3<f64>,
    surface_pressure: Array3<f64>,
    air_temperature: Array3<f64>,
}

impl HumiditySlice {
    /// Opens `source` once, clips the three fields named by `schema` and closes it.
    ///
    /// # Errors
    ///
    /// Same as [`crate::GridSlice::extract`]; a missing field among the three fails
    /// the whole file.
    pub fn extract(
        source: &dyn GridSource,
        bbox: &BoundingBox,
        schema: &GridSchema,
    ) -> Result<Self, GridcastError> {
        let identity = source.identity();
        let file = source.open().map_err(io_error(&identity))?;
        let axes = clip_axes(file.as_ref(), &identity, bbox, schema)?;
        let specific_humidity =
            clip_field(file.as_ref(), &identity, &schema.specific_humidity_field, &axes)?;
        let surface_pressure =
            clip_field(file.as_ref(), &identity, &schema.humidity_pressure_field, &axes)?;
        let air_temperature = clip_field(
            file.as_ref(),
            &identity,
            &schema.humidity_temperature_field,
            &axes,
        )?;
        drop(file);

        debug!(
            "Clipped humidity fields from '{}' to {} days x {} cells",
            identity,
            axes.dates.len(),
            axes.latitudes.len() * axes.longitudes.len()
        );

        Ok(Self {
            dates: axes.dates,
            latitudes: axes.latitudes,
            longitudes: axes.longitudes,
            specific_humidity,
            surface_pressure,
            air_temperature,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.specific_humidity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specific_humidity.is_empty()
    }

    /// One record per (day, lat, lon) cell carrying the three raw values, day-major.
    pub fn records(&self) -> impl Iterator<Item = HumidityRecord> + '_ {
        self.specific_humidity
            .indexed_iter()
            .map(move |((t, i, j), &q)| HumidityRecord {
                date: self.dates[t],
                latitude: self.latitudes[i],
                longitude: self.longitudes[j],
                specific_humidity: q,
                surface_pressure: self.surface_pressure[[t, i, j]],
                air_temperature: self.air_temperature[[t, i, j]],
            })
    }
}
