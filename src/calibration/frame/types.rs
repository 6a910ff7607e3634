//! Core array and acquisition-metadata types.

use crate::calibration::common::error::{CalibrationError, Result};

/// Pixel rows of one sensor module.
pub const MODULE_HEIGHT: usize = 512;
/// Pixel columns of one sensor module.
pub const MODULE_WIDTH: usize = 1024;

/// A 2-D float64 image stored row-major, the working currency of every
/// calibration array (pedestals, gain maps, accumulators).
#[derive(Debug, Clone, PartialEq)]
pub struct Float2D {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

impl Float2D {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn from_data(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != width * height {
            return Err(CalibrationError::Configuration(format!(
                "array of {} elements cannot be {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    /// Errors unless `width`/`height` match this array's shape.
    pub fn check_shape(&self, width: usize, height: usize) -> Result<()> {
        if self.width != width || self.height != height {
            return Err(CalibrationError::ShapeMismatch {
                expected_width: width,
                expected_height: height,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// One raw detector frame: 16-bit words, each a 2-bit gain tag over a 14-bit
/// ADU payload. Immutable once read from the acquisition system.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u16>,
}

impl RawFrame {
    pub fn from_data(width: usize, height: usize, data: Vec<u16>) -> Result<Self> {
        if data.len() != width * height {
            return Err(CalibrationError::Configuration(format!(
                "raw frame of {} words cannot be {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.data[row * self.width + col]
    }
}

/// Identifier of one physical detector module, e.g. "M420".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleId(pub String);

impl ModuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        ModuleId(s.to_string())
    }
}

/// Exposure time in seconds, with an integer microsecond key so pedestal
/// lookups can hash on it without comparing floats directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureTime(pub f64);

impl ExposureTime {
    pub fn key(self) -> u64 {
        (self.0 * 1e6).round() as u64
    }

    pub fn seconds(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for ExposureTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// The gain-mode setting an acquisition was recorded with. `Dynamic` means
/// the hardware switches gain per pixel and the per-pixel tags are
/// meaningful; the fixed/forced labels pin the whole module to one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainModeLabel {
    Dynamic,
    ForceSwitchG1,
    ForceSwitchG2,
    FixG1,
    FixG2,
}

impl GainModeLabel {
    pub fn parse(s: &str) -> Option<GainModeLabel> {
        match s {
            "dynamic" => Some(GainModeLabel::Dynamic),
            "forceswitchg1" => Some(GainModeLabel::ForceSwitchG1),
            "forceswitchg2" => Some(GainModeLabel::ForceSwitchG2),
            "fixgain1" => Some(GainModeLabel::FixG1),
            "fixgain2" => Some(GainModeLabel::FixG2),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GainModeLabel::Dynamic => "dynamic",
            GainModeLabel::ForceSwitchG1 => "forceswitchg1",
            GainModeLabel::ForceSwitchG2 => "forceswitchg2",
            GainModeLabel::FixG1 => "fixgain1",
            GainModeLabel::FixG2 => "fixgain2",
        }
    }
}

impl std::fmt::Display for GainModeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar metadata shared by every frame of one acquisition.
#[derive(Debug, Clone)]
pub struct AcquisitionMeta {
    pub exposure_time: ExposureTime,
    pub module: ModuleId,
    pub gain_label: GainModeLabel,
}

/// An ordered stack of raw frames from one acquisition.
///
/// The whole stack is held in memory; typical pedestal and flat-field runs
/// are a few hundred to a few thousand frames of one module, which fits
/// comfortably. Streaming is only needed (and provided) on the mask path.
#[derive(Debug, Clone)]
pub struct RawStack {
    pub meta: AcquisitionMeta,
    pub frames: Vec<RawFrame>,
}

impl RawStack {
    pub fn new(meta: AcquisitionMeta, frames: Vec<RawFrame>) -> Self {
        Self { meta, frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// An intensity-calibrated frame in photon-equivalent units.
///
/// Being its own type (rather than a bare [`Float2D`]) is the "corrected"
/// marker downstream consumers key on; only the corrector and tests build
/// these.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedFrame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

impl CorrectedFrame {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }
}

/// Trusted-pixel mask: 1 marks a pixel to exclude from analysis, 0 a pixel
/// whose flat-field statistics look healthy.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u32>,
}

impl Mask {
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.data[row * self.width + col]
    }

    /// Number of pixels flagged for exclusion.
    pub fn masked_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}
