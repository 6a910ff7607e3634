pub mod types;

pub use types::{
    AcquisitionMeta, CorrectedFrame, ExposureTime, Float2D, GainModeLabel, Mask, ModuleId,
    RawFrame, RawStack, MODULE_HEIGHT, MODULE_WIDTH,
};
