use thiserror::Error;

/// Errors raised by the scout pipeline and its collaborators
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Missing data: {0}")]
    MissingData(String),
}

pub type Result<T> = std::result::Result<T, ScoutError>;
