use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot read base directory {}: {source}", path.display())]
    BaseDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No {variable} data for grid square {identifier} ({})", path.display())]
    DatasetNotFound {
        identifier: String,
        variable: String,
        path: PathBuf,
    },

    #[error("Invalid {variable} data for grid square {identifier}: {message}")]
    DatasetFormat {
        identifier: String,
        variable: String,
        message: String,
    },

    #[error("Malformed raster: {0}")]
    MalformedRaster(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl ProcessingError {
    pub fn dataset_format(
        identifier: impl Into<String>,
        variable: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ProcessingError::DatasetFormat {
            identifier: identifier.into(),
            variable: variable.into(),
            message: message.into(),
        }
    }
}
