//! Correction configuration.

/// Settings for a correction pass.
#[derive(Debug, Clone, Copy)]
pub struct CorrectionConfig {
    /// Incident photon energy in keV. The gain maps are calibrated per unit
    /// energy, so this scales gain-corrected values to photon-equivalent
    /// intensity.
    pub energy_kev: f64,
    /// Whether each incoming frame's shape is checked against the
    /// calibration arrays before correcting. Turning this off skips the
    /// per-frame equality check when the caller already guarantees matching
    /// shapes; a frame larger than the calibration planes is still rejected
    /// rather than read past them.
    pub validate_shapes: bool,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            energy_kev: 1.0,
            validate_shapes: true,
        }
    }
}

impl CorrectionConfig {
    pub fn builder() -> CorrectionConfigBuilder {
        CorrectionConfigBuilder::default()
    }
}

/// Builder for [`CorrectionConfig`].
#[derive(Default)]
pub struct CorrectionConfigBuilder {
    energy_kev: Option<f64>,
    validate_shapes: Option<bool>,
}

impl CorrectionConfigBuilder {
    pub fn energy_kev(mut self, energy_kev: f64) -> Self {
        self.energy_kev = Some(energy_kev);
        self
    }

    pub fn validate_shapes(mut self, validate: bool) -> Self {
        self.validate_shapes = Some(validate);
        self
    }

    pub fn build(self) -> CorrectionConfig {
        let default = CorrectionConfig::default();
        CorrectionConfig {
            energy_kev: self.energy_kev.unwrap_or(default.energy_kev),
            validate_shapes: self.validate_shapes.unwrap_or(default.validate_shapes),
        }
    }
}
