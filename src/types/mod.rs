pub mod bounding_box;
pub mod daily_series;
pub mod forecast_result;
pub mod records;
pub mod request;
pub mod variable;
pub mod year_window;
