//! NetCDF (and NetCDF-4/HDF5) files on disk, read through the system netCDF library.

use crate::grid::packing::decode_packed;
use crate::grid::source::{GridFile, GridSource};
use ndarray::{ArrayD, IxDyn};
use std::io;
use std::path::PathBuf;

/// A gridded file on disk. Opening it opens the netCDF handle; dropping the
/// returned [`GridFile`] closes it.
#[derive(Debug, Clone)]
pub struct NetcdfSource {
    path: PathBuf,
}

impl NetcdfSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

struct NetcdfFile {
    file: netcdf::File,
}

fn to_io(e: netcdf::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

fn f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !var.attributes().any(|attr| attr.name() == name) {
        return None;
    }
    let value = var.attribute_value(name)?.ok()?;
    f64::try_from(value).ok()
}

/// Masks fill values as NaN and applies `scale_factor`/`add_offset`.
fn decode(var: &netcdf::Variable, mut values: Vec<f64>) -> Vec<f64> {
    let fill = f64_attr(var, "_FillValue").or_else(|| f64_attr(var, "missing_value"));
    let scale = f64_attr(var, "scale_factor").unwrap_or(1.0);
    let offset = f64_attr(var, "add_offset").unwrap_or(0.0);
    decode_packed(&mut values, fill, scale, offset);
    values
}

impl GridFile for NetcdfFile {
    fn read_axis(&self, name: &str) -> io::Result<Option<Vec<f64>>> {
        match self.file.variable(name) {
            Some(var) => var.get_values::<f64, _>(..).map(Some).map_err(to_io),
            None => Ok(None),
        }
    }

    fn read_field(&self, name: &str) -> io::Result<Option<ArrayD<f64>>> {
        let Some(var) = self.file.variable(name) else {
            return Ok(None);
        };
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let values = decode(&var, var.get_values::<f64, _>(..).map_err(to_io)?);
        ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl GridSource for NetcdfSource {
    fn identity(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> io::Result<Box<dyn GridFile + '_>> {
        let file = netcdf::open(&self.path).map_err(to_io)?;
        Ok(Box::new(NetcdfFile { file }))
    }
}
