use thiserror::Error;

/// Model output that could not be recovered as JSON
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Model output is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
