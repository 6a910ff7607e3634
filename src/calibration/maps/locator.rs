//! Seam to the installation's detector configuration and calibration layout.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::frame::types::ModuleId;

/// Answers the two questions the gain-map loader needs from the outside
/// world: which modules make up a detector, and where a module's calibration
/// binary might live. The store enforces the exactly-one-candidate contract.
pub trait CalibrationLocator {
    /// Module identifiers belonging to `detector`.
    fn detector_modules(&self, detector: &str) -> Result<Vec<ModuleId>>;

    /// Candidate gain-map binary files for one module.
    fn gain_map_candidates(&self, module: &ModuleId) -> Result<Vec<PathBuf>>;
}

/// Locator for the standard installation layout: one directory per module
/// named `<module>_fullspeed` under a calibration root, containing the
/// module's `.bin` gain-map file. Detector membership is injected at
/// construction since it comes from site configuration, not the filesystem.
pub struct DirectoryLocator {
    root: PathBuf,
    detectors: HashMap<String, Vec<ModuleId>>,
}

impl DirectoryLocator {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            detectors: HashMap::new(),
        }
    }

    pub fn with_detector(mut self, detector: &str, modules: Vec<ModuleId>) -> Self {
        self.detectors.insert(detector.to_string(), modules);
        self
    }
}

impl CalibrationLocator for DirectoryLocator {
    fn detector_modules(&self, detector: &str) -> Result<Vec<ModuleId>> {
        self.detectors.get(detector).cloned().ok_or_else(|| {
            CalibrationError::Configuration(format!("unknown detector '{detector}'"))
        })
    }

    fn gain_map_candidates(&self, module: &ModuleId) -> Result<Vec<PathBuf>> {
        let dir = self.root.join(format!("{}_fullspeed", module.as_str()));
        let mut candidates = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "bin") {
                candidates.push(path);
            }
        }
        candidates.sort();
        Ok(candidates)
    }
}
