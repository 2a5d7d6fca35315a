pub mod conversion;
pub mod reducer;
