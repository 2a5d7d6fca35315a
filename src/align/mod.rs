pub mod aligner;
pub mod historical_frame;
