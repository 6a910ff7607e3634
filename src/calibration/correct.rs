pub mod corrector;
pub mod types;

pub use corrector::{correct_stack, FrameCorrector};
pub use types::{CorrectionConfig, CorrectionConfigBuilder};
