//! Calibration core for Jungfrau-style multi-gain pixel detectors.
//!
//! Turns raw 16-bit detector words (2-bit gain tag + 14-bit ADU payload)
//! into photon-equivalent intensity frames, with separate modules for
//! gain-mode decoding, pedestal averaging, gain-map loading, frame
//! correction and trusted-pixel mask derivation.

pub mod common;
pub mod correct;
pub mod frame;
pub mod gain;
pub mod maps;
pub mod mask;
pub mod pedestal;


pub use common::{CalibrationError, Result};

pub use frame::{
    AcquisitionMeta, CorrectedFrame, ExposureTime, Float2D, GainModeLabel, Mask, ModuleId,
    RawFrame, RawStack, MODULE_HEIGHT, MODULE_WIDTH,
};

pub use gain::GainMode;

pub use maps::{CalibrationLocator, DirectoryLocator, GainMapSet, GainMapStore};

pub use pedestal::{PedestalAverager, PedestalSet, PedestalStore, PedestalStoreBuilder};

pub use correct::{correct_stack, CorrectionConfig, CorrectionConfigBuilder, FrameCorrector};

pub use mask::{derive_mask, MomentAccumulator, DISPERSION_THRESHOLD};
