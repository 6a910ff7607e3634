//! Trusted-pixel mask derivation from flat-field data.
//!
//! Under uniform illumination a healthy pixel's photon counts are close to
//! Poisson, so the variance-to-mean ratio (dispersion) sits near 1. Pixels
//! at module seams or with defective read-out show excess variance; anything
//! dispersing above [`DISPERSION_THRESHOLD`] gets masked out of analysis.

use tracing::{info, instrument};

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::frame::types::{CorrectedFrame, Float2D, GainModeLabel, Mask};

/// Dispersion above which a pixel is excluded. Poisson statistics put
/// well-behaved pixels near 1; 3 leaves generous headroom for gain and
/// pedestal imperfections before a pixel is declared untrustworthy.
pub const DISPERSION_THRESHOLD: f64 = 3.0;

/// Running first and second moments of a corrected-frame stream.
///
/// Holds one sum and one sum-of-squares plane regardless of how many frames
/// pass through, so memory stays bounded by the frame size. Frame order
/// does not affect the result beyond float summation order.
#[derive(Debug)]
pub struct MomentAccumulator {
    sum: Float2D,
    sum_sq: Float2D,
    count: usize,
}

impl MomentAccumulator {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            sum: Float2D::zeros(width, height),
            sum_sq: Float2D::zeros(width, height),
            count: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Folds one corrected frame into the running moments.
    pub fn push(&mut self, frame: &CorrectedFrame) -> Result<()> {
        if frame.width != self.sum.width || frame.height != self.sum.height {
            return Err(CalibrationError::ShapeMismatch {
                expected_width: self.sum.width,
                expected_height: self.sum.height,
                width: frame.width,
                height: frame.height,
            });
        }
        for (index, &value) in frame.data.iter().enumerate() {
            self.sum.data[index] += value;
            self.sum_sq.data[index] += value * value;
        }
        self.count += 1;
        Ok(())
    }

    /// Finishes accumulation into a mask of statistically anomalous pixels.
    ///
    /// mean = sum/N, variance = sumsq/N - mean^2. A pixel with mean exactly
    /// 0 has its mean replaced by 1 before dividing, so a pixel that showed
    /// no signal is trusted by default instead of dividing by zero. Masked
    /// iff dispersion is strictly above the threshold.
    pub fn finish(self) -> Result<Mask> {
        if self.count == 0 {
            return Err(CalibrationError::Precondition(
                "cannot derive a mask from zero corrected frames".to_string(),
            ));
        }

        let n = self.count as f64;
        let data = self
            .sum
            .data
            .iter()
            .zip(&self.sum_sq.data)
            .map(|(&sum, &sum_sq)| {
                let mean = sum / n;
                let var = sum_sq / n - mean * mean;
                let divisor = if mean == 0.0 { 1.0 } else { mean };
                u32::from(var / divisor > DISPERSION_THRESHOLD)
            })
            .collect();

        let mask = Mask {
            width: self.sum.width,
            height: self.sum.height,
            data,
        };
        info!(
            "Masking {} of {} pixels",
            mask.masked_count(),
            mask.width * mask.height
        );
        Ok(mask)
    }
}

/// Derives the trusted-pixel mask from a single-pass stream of corrected
/// flat-field frames.
///
/// The acquisition must have been taken with the `dynamic` gain label, since
/// only then do the per-pixel tags reflect real gain switching and the
/// correction upstream of this stream is meaningful; any other label is
/// rejected before a single frame is consumed.
#[instrument(skip(frames))]
pub fn derive_mask(
    gain_label: GainModeLabel,
    frames: impl IntoIterator<Item = CorrectedFrame>,
) -> Result<Mask> {
    if gain_label != GainModeLabel::Dynamic {
        return Err(CalibrationError::Precondition(format!(
            "mask derivation requires gain mode '{}', acquisition is '{}'",
            GainModeLabel::Dynamic,
            gain_label
        )));
    }

    let mut frames = frames.into_iter();
    let Some(first) = frames.next() else {
        return Err(CalibrationError::Precondition(
            "cannot derive a mask from an empty flat-field stream".to_string(),
        ));
    };

    let mut acc = MomentAccumulator::new(first.width, first.height);
    acc.push(&first)?;
    for frame in frames {
        acc.push(&frame)?;
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(values: &[f64]) -> CorrectedFrame {
        CorrectedFrame {
            width: values.len(),
            height: 1,
            data: values.to_vec(),
        }
    }

    /// Stream of single-pixel frames with the given values.
    fn pixel_stream(values: &[f64]) -> Vec<CorrectedFrame> {
        values.iter().map(|&v| frame(&[v])).collect()
    }

    #[test]
    fn test_threshold_is_strict() {
        // {-1, 2, 5}: mean 2, variance 6, dispersion exactly 3.0 -> unmasked
        let mask = derive_mask(GainModeLabel::Dynamic, pixel_stream(&[-1.0, 2.0, 5.0])).unwrap();
        assert_eq!(mask.get(0, 0), 0);

        // nudge the spread so dispersion goes just above 3
        let mask =
            derive_mask(GainModeLabel::Dynamic, pixel_stream(&[-1.01, 2.0, 5.01])).unwrap();
        assert_eq!(mask.get(0, 0), 1);
    }

    #[test]
    fn test_zero_mean_pixel_uses_unit_divisor() {
        // mean 0, variance 4: dispersion = 4/1 > 3, masked
        let mask = derive_mask(GainModeLabel::Dynamic, pixel_stream(&[-2.0, 2.0])).unwrap();
        assert_eq!(mask.get(0, 0), 1);

        // mean 0, variance 1: dispersion 1, trusted
        let mask = derive_mask(GainModeLabel::Dynamic, pixel_stream(&[-1.0, 1.0])).unwrap();
        assert_eq!(mask.get(0, 0), 0);
    }

    #[test]
    fn test_frame_order_does_not_change_the_mask() {
        let values = [0.5, 7.25, -3.0, 12.0, 1.5, 0.25, -4.5, 8.0];
        let forward = derive_mask(GainModeLabel::Dynamic, pixel_stream(&values)).unwrap();
        let mut reversed = values;
        reversed.reverse();
        let backward = derive_mask(GainModeLabel::Dynamic, pixel_stream(&reversed)).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_non_dynamic_acquisition_rejected_before_accumulation() {
        let err = derive_mask(
            GainModeLabel::ForceSwitchG1,
            pixel_stream(&[1.0, 2.0]),
        )
        .unwrap_err();
        match err {
            CalibrationError::Precondition(msg) => {
                assert!(msg.contains("dynamic") && msg.contains("forceswitchg1"));
            }
            other => panic!("expected precondition error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_stream_rejected() {
        assert!(derive_mask(GainModeLabel::Dynamic, Vec::new()).is_err());
    }

    #[test]
    fn test_mismatched_frame_shape_rejected() {
        let mut acc = MomentAccumulator::new(2, 1);
        acc.push(&frame(&[1.0, 2.0])).unwrap();
        assert!(acc.push(&frame(&[1.0, 2.0, 3.0])).is_err());
    }

    #[test]
    fn test_accumulator_streams_without_holding_frames() {
        let mut acc = MomentAccumulator::new(1, 1);
        for value in [1.0, 2.0, 3.0, 4.0] {
            let f = frame(&[value]);
            acc.push(&f).unwrap();
            drop(f);
        }
        assert_eq!(acc.count(), 4);
        let mask = acc.finish().unwrap();
        // mean 2.5, variance 1.25, dispersion 0.5
        assert_eq!(mask.get(0, 0), 0);
    }
}
