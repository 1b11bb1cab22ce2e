use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record is not valid JSON: {0}")]
    Parse(#[from] simd_json::Error),

    #[error("Record is not a JSON object")]
    NotAnObject,

    #[error("Record is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Failed to encode command envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecordError>;
