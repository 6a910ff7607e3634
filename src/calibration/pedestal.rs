pub mod averager;
pub mod store;

pub use averager::PedestalAverager;
pub use store::{PedestalSet, PedestalStore, PedestalStoreBuilder};
