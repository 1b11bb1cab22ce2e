use me_http::HttpError;
use me_types::RecordError;
use me_zmq::ZmqError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Queue transport error: {0}")]
    Zmq(#[from] ZmqError),

    #[error("Indexing backend error: {0}")]
    Http(#[from] HttpError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("All {0} sink workers have stopped")]
    SinkPoolExhausted(usize),
}

pub type Result<T> = std::result::Result<T, EngineError>;
