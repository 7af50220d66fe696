use thiserror::Error;

#[derive(Error, Debug)]
pub enum PricewiseError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Cannot average empty group: {0}")]
    EmptyGroup(String),

    #[error("Invalid price sweep: {0}")]
    InvalidSweep(String),

    #[error("{0}")]
    Validation(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PricewiseError>;
