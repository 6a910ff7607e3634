use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Corrupt pixel data: gain tag {tag} at pixel ({row}, {col}) is outside the hardware range")]
    DataIntegrity { tag: u16, row: usize, col: usize },

    #[error("Shape mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    ShapeMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CalibrationError>;
