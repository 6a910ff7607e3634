pub mod locator;
pub mod store;

pub use locator::{CalibrationLocator, DirectoryLocator};
pub use store::{GainMapSet, GainMapStore};
