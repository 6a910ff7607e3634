//! Keyed storage of averaged pedestal data.

use std::collections::HashMap;

use crate::calibration::frame::types::{ExposureTime, Float2D, ModuleId};
use crate::calibration::gain::GainMode;

/// The per-mode pedestal planes of one (exposure time, module) pair.
///
/// A pedestal campaign may cover fewer than three modes; the corrector
/// checks completeness up front rather than discovering a hole mid-frame.
#[derive(Debug, Clone, Default)]
pub struct PedestalSet {
    maps: [Option<Float2D>; 3],
}

impl PedestalSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: GainMode, pedestal: Float2D) -> Self {
        self.maps[mode.index()] = Some(pedestal);
        self
    }

    pub fn mode(&self, mode: GainMode) -> Option<&Float2D> {
        self.maps[mode.index()].as_ref()
    }

    /// Modes this set has no pedestal plane for, in mode order.
    pub fn missing_modes(&self) -> Vec<GainMode> {
        GainMode::ALL
            .into_iter()
            .filter(|mode| self.maps[mode.index()].is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.maps.iter().all(Option::is_some)
    }
}

/// Read-only lookup of pedestal sets by (exposure time, module).
///
/// Built once from a pedestal campaign via [`PedestalStoreBuilder`], then
/// only queried; exposure times hash on their microsecond key.
#[derive(Debug, Default)]
pub struct PedestalStore {
    entries: HashMap<(u64, ModuleId), PedestalSet>,
}

impl PedestalStore {
    pub fn builder() -> PedestalStoreBuilder {
        PedestalStoreBuilder::default()
    }

    pub fn contains(&self, exposure: ExposureTime, module: &ModuleId) -> bool {
        self.entries.contains_key(&(exposure.key(), module.clone()))
    }

    pub fn get(&self, exposure: ExposureTime, module: &ModuleId) -> Option<&PedestalSet> {
        self.entries.get(&(exposure.key(), module.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PedestalStoreBuilder {
    entries: HashMap<(u64, ModuleId), PedestalSet>,
}

impl PedestalStoreBuilder {
    pub fn insert(
        mut self,
        exposure: ExposureTime,
        module: ModuleId,
        mode: GainMode,
        pedestal: Float2D,
    ) -> Self {
        let set = self
            .entries
            .entry((exposure.key(), module))
            .or_insert_with(PedestalSet::empty);
        set.maps[mode.index()] = Some(pedestal);
        self
    }

    pub fn build(self) -> PedestalStore {
        PedestalStore {
            entries: self.entries,
        }
    }
}
