//! Per-module gain-map calibration data.
//!
//! A module's calibration binary is three consecutive float64 planes of
//! shape 512x1024 in row-major order, one per gain mode (g0, g1, g2), in
//! the byte order of the machine that produced it (native order here; the
//! files never travel between architectures).

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::frame::types::{Float2D, ModuleId, MODULE_HEIGHT, MODULE_WIDTH};
use crate::calibration::gain::GainMode;
use crate::calibration::maps::locator::CalibrationLocator;

/// The three per-pixel multiplicative gain maps of one module.
#[derive(Debug, Clone)]
pub struct GainMapSet {
    maps: [Float2D; 3],
}

impl GainMapSet {
    /// Builds a set from three equally-shaped planes, g0 first.
    pub fn new(g0: Float2D, g1: Float2D, g2: Float2D) -> Result<Self> {
        g1.check_shape(g0.width, g0.height)?;
        g2.check_shape(g0.width, g0.height)?;
        Ok(Self { maps: [g0, g1, g2] })
    }

    pub fn mode(&self, mode: GainMode) -> &Float2D {
        &self.maps[mode.index()]
    }

    pub fn width(&self) -> usize {
        self.maps[0].width
    }

    pub fn height(&self) -> usize {
        self.maps[0].height
    }

    /// Parses a module calibration binary: 3 x 512 x 1024 native-endian f64.
    pub fn from_calibration_bytes(bytes: &[u8]) -> Result<Self> {
        const PLANE: usize = MODULE_HEIGHT * MODULE_WIDTH;
        const EXPECTED: usize = 3 * PLANE * size_of::<f64>();
        if bytes.len() != EXPECTED {
            return Err(CalibrationError::Configuration(format!(
                "gain-map binary is {} bytes, expected {EXPECTED}",
                bytes.len()
            )));
        }

        let values: Vec<f64> = bytes
            .chunks_exact(size_of::<f64>())
            .map(|chunk| f64::from_ne_bytes(chunk.try_into().unwrap()))
            .collect();

        let plane = |index: usize| {
            Float2D::from_data(
                MODULE_WIDTH,
                MODULE_HEIGHT,
                values[index * PLANE..(index + 1) * PLANE].to_vec(),
            )
        };
        GainMapSet::new(plane(0)?, plane(1)?, plane(2)?)
    }
}

/// Read-only collection of gain maps for every module of one detector.
///
/// Populated once at load time; correction and mask derivation only ever
/// query it.
#[derive(Debug)]
pub struct GainMapStore {
    maps: HashMap<ModuleId, GainMapSet>,
}

impl GainMapStore {
    /// Loads the gain maps of every module belonging to `detector`.
    ///
    /// Fails with a configuration error if the locator yields zero or more
    /// than one calibration binary for any module.
    #[instrument(skip(locator))]
    pub fn load(detector: &str, locator: &dyn CalibrationLocator) -> Result<Self> {
        let modules = locator.detector_modules(detector)?;
        info!("Loading gain maps for {} modules", modules.len());

        let mut maps = HashMap::new();
        for module in modules {
            let candidates = locator.gain_map_candidates(&module)?;
            let path = match candidates.as_slice() {
                [path] => path,
                [] => {
                    return Err(CalibrationError::Configuration(format!(
                        "no gain-map binary found for module {module}"
                    )));
                }
                many => {
                    return Err(CalibrationError::Configuration(format!(
                        "{} gain-map binaries found for module {module}, expected exactly one",
                        many.len()
                    )));
                }
            };

            debug!("Reading gain maps for {} from {}", module, path.display());
            let bytes = std::fs::read(path)?;
            maps.insert(module, GainMapSet::from_calibration_bytes(&bytes)?);
        }

        Ok(Self { maps })
    }

    /// Builds a store from already-parsed sets. Used by tests and tooling
    /// that sources calibration data from somewhere other than the
    /// installation tree.
    pub fn from_sets(sets: impl IntoIterator<Item = (ModuleId, GainMapSet)>) -> Self {
        Self {
            maps: sets.into_iter().collect(),
        }
    }

    pub fn get(&self, module: &ModuleId) -> Option<&GainMapSet> {
        self.maps.get(module)
    }

    pub fn contains(&self, module: &ModuleId) -> bool {
        self.maps.contains_key(module)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleId> {
        self.maps.keys()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
