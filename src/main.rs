use anyhow::{bail, Context};
use jungfrau_calib::calibration::{DirectoryLocator, GainMapStore, ModuleId};
use jungfrau_calib::logger;

use tracing::info;

/// Loads the gain-map calibration for one detector and reports what it
/// found. Detector membership and the calibration root come from the
/// environment; the full acquisition front-end lives outside this crate.
fn main() -> anyhow::Result<()> {
    logger::init();

    let mut args = std::env::args().skip(1);
    let Some(detector) = args.next() else {
        bail!("usage: jungfrau_calib <detector>");
    };
    let root = std::env::var("JUNGFRAU_CALIBRATION_ROOT")
        .context("JUNGFRAU_CALIBRATION_ROOT must point at the calibration tree")?;
    let modules = std::env::var("JUNGFRAU_MODULES")
        .context("JUNGFRAU_MODULES must list the detector's modules, comma separated")?;
    let modules: Vec<ModuleId> = modules.split(',').map(ModuleId::from).collect();

    info!("Loading calibration for detector {detector}");
    let locator = DirectoryLocator::new(&root).with_detector(&detector, modules);
    let store = GainMapStore::load(&detector, &locator)?;

    for module in store.modules() {
        info!("Module {module}: gain maps loaded");
    }
    info!("{} modules ready", store.len());

    Ok(())
}
