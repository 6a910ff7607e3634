pub mod error;

pub use error::{CalibrationError, Result};
