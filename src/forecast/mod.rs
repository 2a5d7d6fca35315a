pub mod engine;
pub mod forest;
pub mod windows;
