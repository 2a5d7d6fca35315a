//! Seams between the pipeline and the gridded files it reads.
//!
//! A [`GridSource`] is an openable reference (a path, an in-memory grid, a remote
//! handle wrapped by the caller). Opening it yields a [`GridFile`], which is read
//! within one extraction call and dropped, closing the underlying handle, before the
//! next file is opened.

use crate::types::variable::Variable;
use ndarray::ArrayD;
use std::collections::HashMap;
use std::fmt;
use std::io;

/// An open gridded file.
pub trait GridFile {
    /// Reads a one-dimensional coordinate variable (`lat`, `lon`, `time`).
    ///
    /// Returns `Ok(None)` when the file has no variable of that name.
    fn read_axis(&self, name: &str) -> io::Result<Option<Vec<f64>>>;

    /// Reads a data variable with all of its dimensions.
    ///
    /// Returns `Ok(None)` when the file has no variable of that name.
    fn read_field(&self, name: &str) -> io::Result<Option<ArrayD<f64>>>;
}

/// A reference to a gridded file that can be opened for reading.
pub trait GridSource: fmt::Debug {
    /// Human-readable identity attached to errors and log lines.
    fn identity(&self) -> String;

    /// Opens the file. The returned handle is released when dropped.
    fn open(&self) -> io::Result<Box<dyn GridFile + '_>>;
}

/// A gridded file held in memory.
///
/// Useful for tests and for callers that decode files themselves.
///
/// # Examples
///
/// ```
/// use gridcast::MemoryGrid;
/// use ndarray::Array3;
///
/// let grid = MemoryGrid::new("sample")
///     .with_axis("lat", vec![4.5, 4.75])
///     .with_axis("lon", vec![-74.25, -74.0])
///     .with_axis("time", vec![0.0])
///     .with_field("Wind_f_tavg", Array3::from_elem((1, 2, 2), 3.0).into_dyn());
/// assert_eq!(grid.field_names().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryGrid {
    name: String,
    axes: HashMap<String, Vec<f64>>,
    fields: HashMap<String, ArrayD<f64>>,
}

impl MemoryGrid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_axis(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.axes.insert(name.into(), values);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, values: ArrayD<f64>) -> Self {
        self.fields.insert(name.into(), values);
        self
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }
}

struct MemoryGridFile<'a>(&'a MemoryGrid);

impl GridFile for MemoryGridFile<'_> {
    fn read_axis(&self, name: &str) -> io::Result<Option<Vec<f64>>> {
        Ok(self.0.axes.get(name).cloned())
    }

    fn read_field(&self, name: &str) -> io::Result<Option<ArrayD<f64>>> {
        Ok(self.0.fields.get(name).cloned())
    }
}

impl GridSource for MemoryGrid {
    fn identity(&self) -> String {
        self.name.clone()
    }

    fn open(&self) -> io::Result<Box<dyn GridFile + '_>> {
        Ok(Box::new(MemoryGridFile(self)))
    }
}

/// Gridded files for every variable of one request, each list in the order the
/// historical years are walked (most recent year first).
#[derive(Debug, Default)]
pub struct GridSources {
    sources: HashMap<Variable, Vec<Box<dyn GridSource>>>,
}

impl GridSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a file to the list of `variable`.
    pub fn push(&mut self, variable: Variable, source: impl GridSource + 'static) {
        self.sources
            .entry(variable)
            .or_default()
            .push(Box::new(source));
    }

    /// Builder-style [`GridSources::push`].
    pub fn with(mut self, variable: Variable, source: impl GridSource + 'static) -> Self {
        self.push(variable, source);
        self
    }

    /// The files of `variable`, or an empty slice.
    pub fn get(&self, variable: Variable) -> &[Box<dyn GridSource>] {
        self.sources
            .get(&variable)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
