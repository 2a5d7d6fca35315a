use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataFormatError {
    #[error("Gridded file '{file}' has no variable '{variable}'")]
    MissingVariable { file: String, variable: String },

    #[error("Gridded file '{file}' has no '{axis}' axis")]
    MissingAxis { file: String, axis: String },

    #[error("Variable '{variable}' in '{file}' has {found} dimensions, expected 2 (lat, lon) or 3 (time, lat, lon)")]
    UnexpectedRank {
        file: String,
        variable: String,
        found: usize,
    },

    #[error("Variable '{variable}' in '{file}' has shape {shape:?} which does not match time={time}, lat={lat}, lon={lon}")]
    ShapeMismatch {
        file: String,
        variable: String,
        shape: Vec<usize>,
        time: usize,
        lat: usize,
        lon: usize,
    },

    #[error("Time offset {offset} in '{file}' does not map to a calendar date")]
    InvalidTimeOffset { file: String, offset: f64 },

    #[error("Historical frame has missing values in column '{0}'")]
    MissingValues(String),

    #[error("Historical frame is missing column '{0}'")]
    MissingColumn(String),
}
