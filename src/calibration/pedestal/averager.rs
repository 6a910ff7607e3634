//! Pedestal (dark baseline) averaging from dedicated pedestal acquisitions.

use tracing::{debug, instrument};

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::frame::types::{Float2D, RawStack};
use crate::calibration::gain::{self, GainMode};

/// Averages the dark signal of one gain mode across a raw pedestal stack.
///
/// Forced-gain pedestal runs still leave individual pixels in other modes on
/// individual frames, so a raw value only contributes when its own decoded
/// tag matches the requested mode; per-pixel observation counts make the
/// average exact rather than assuming the full stack depth.
pub struct PedestalAverager {
    mode: GainMode,
}

impl PedestalAverager {
    pub fn new(mode: GainMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> GainMode {
        self.mode
    }

    /// Produces the per-pixel mean dark signal for this averager's mode.
    ///
    /// A pixel never observed in the requested mode gets the divisor
    /// substituted with 1, so its pedestal comes out as exactly 0.0 instead
    /// of NaN or infinity. Callers must read such a 0.0 as "no valid
    /// samples", not as a measured baseline of zero.
    #[instrument(skip(self, stack), fields(mode = %self.mode, frames = stack.len()))]
    pub fn average(&self, stack: &RawStack) -> Result<Float2D> {
        let first = stack.frames.first().ok_or_else(|| {
            CalibrationError::Precondition(format!(
                "pedestal stack for module {} is empty",
                stack.meta.module
            ))
        })?;
        let (width, height) = (first.width, first.height);

        let mut sum = Float2D::zeros(width, height);
        let mut counts = vec![0u32; width * height];

        for frame in &stack.frames {
            if frame.width != width || frame.height != height {
                return Err(CalibrationError::ShapeMismatch {
                    expected_width: width,
                    expected_height: height,
                    width: frame.width,
                    height: frame.height,
                });
            }
            for (index, &raw) in frame.data.iter().enumerate() {
                let (mode, payload) =
                    gain::decode(raw).ok_or_else(|| CalibrationError::DataIntegrity {
                        tag: raw >> gain::PAYLOAD_BITS,
                        row: index / width,
                        col: index % width,
                    })?;
                if mode == self.mode {
                    sum.data[index] += payload as f64;
                    counts[index] += 1;
                }
            }
        }

        let unobserved = counts.iter().filter(|&&c| c == 0).count();
        if unobserved > 0 {
            debug!(
                "{} pixels never seen in {} across {} frames",
                unobserved,
                self.mode,
                stack.len()
            );
        }

        // zero-observation pixels divide by 1 and stay at 0.0
        for (value, &count) in sum.data.iter_mut().zip(&counts) {
            *value /= count.max(1) as f64;
        }

        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::frame::types::{
        AcquisitionMeta, ExposureTime, GainModeLabel, ModuleId, RawFrame,
    };
    use crate::calibration::gain::encode;

    fn stack_from_frames(frames: Vec<RawFrame>) -> RawStack {
        RawStack::new(
            AcquisitionMeta {
                exposure_time: ExposureTime(0.001),
                module: ModuleId::from("M001"),
                gain_label: GainModeLabel::Dynamic,
            },
            frames,
        )
    }

    #[test]
    fn test_average_uses_only_matching_mode_samples() {
        // pixel 0: mode 1 on even frames with 10/20/30, mode 0 otherwise
        let mut frames = Vec::new();
        for payload in [10u16, 20, 30] {
            frames.push(RawFrame::from_data(2, 1, vec![encode(GainMode::G1, payload), 0]).unwrap());
            frames.push(RawFrame::from_data(2, 1, vec![encode(GainMode::G0, 9999), 0]).unwrap());
        }

        let pedestal = PedestalAverager::new(GainMode::G1)
            .average(&stack_from_frames(frames))
            .unwrap();
        assert_eq!(pedestal.get(0, 0), 20.0);
    }

    #[test]
    fn test_zero_observation_pixel_falls_back_to_zero() {
        let frames = vec![
            RawFrame::from_data(1, 1, vec![encode(GainMode::G0, 123)]).unwrap();
            5
        ];
        let pedestal = PedestalAverager::new(GainMode::G2)
            .average(&stack_from_frames(frames))
            .unwrap();
        assert_eq!(pedestal.get(0, 0), 0.0);
        assert!(pedestal.get(0, 0).is_finite());
    }

    #[test]
    fn test_gain_bits_masked_out_of_payload() {
        // mode 2 rides on wire tag 3, so the raw word is 0xC000 | payload
        let frames = vec![RawFrame::from_data(1, 1, vec![encode(GainMode::G2, 0x3FFF)]).unwrap()];
        let pedestal = PedestalAverager::new(GainMode::G2)
            .average(&stack_from_frames(frames))
            .unwrap();
        assert_eq!(pedestal.get(0, 0), 0x3FFF as f64);
    }

    #[test]
    fn test_empty_stack_is_a_precondition_failure() {
        let result = PedestalAverager::new(GainMode::G0).average(&stack_from_frames(Vec::new()));
        assert!(matches!(
            result.unwrap_err(),
            CalibrationError::Precondition(_)
        ));
    }

    #[test]
    fn test_corrupt_tag_aborts_averaging() {
        let frames = vec![RawFrame::from_data(1, 1, vec![2u16 << 14]).unwrap()];
        let result = PedestalAverager::new(GainMode::G0).average(&stack_from_frames(frames));
        assert!(matches!(
            result.unwrap_err(),
            CalibrationError::DataIntegrity { tag: 2, .. }
        ));
    }
}
