use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid index name '{name}': {reason}")]
    InvalidIndexName { name: String, reason: &'static str },

    #[error("Invalid backend host: {0}")]
    InvalidHost(String),
}

impl HttpError {
    /// True when the backend could not be reached at all
    pub fn is_connect(&self) -> bool {
        matches!(self, HttpError::RequestFailed(err) if err.is_connect())
    }
}

pub type Result<T> = std::result::Result<T, HttpError>;
