pub mod distance;
pub mod engine;
pub mod velocity;

pub use engine::{AnalysisEngine, AnalysisError};
pub use velocity::SUSPICIOUS_SPEED_MPH;
