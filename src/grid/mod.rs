pub mod error;
pub mod extractor;
pub mod humidity;
#[cfg(feature = "netcdf")]
pub mod netcdf_source;
pub mod packing;
pub mod source;
