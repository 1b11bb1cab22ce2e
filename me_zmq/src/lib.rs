use std::sync::OnceLock;

pub mod errors;
pub mod pull;
pub mod push;
pub mod request;

pub use errors::Result;
pub use errors::ZmqError;
pub use pull::Puller;
pub use push::Pusher;
pub use request::Requester;

/// Common ZeroMQ address patterns
pub mod addresses {
    /// TCP address prefix
    pub const TCP_PREFIX: &str = "tcp://";

    /// TCP address pattern for connecting (localhost)
    pub const TCP_LOCALHOST: &str = "tcp://127.0.0.1";

    /// IPC address pattern (Unix domain sockets)
    pub const IPC_PREFIX: &str = "ipc://";

    /// In-process address pattern
    pub const INPROC_PREFIX: &str = "inproc://";
}

/// Process-wide context shared by every socket this crate opens, so
/// `inproc://` endpoints pair up across wrappers
pub(crate) fn context() -> zmq::Context {
    static CONTEXT: OnceLock<zmq::Context> = OnceLock::new();
    CONTEXT.get_or_init(zmq::Context::new).clone()
}

/// Rejects endpoints that do not name a supported transport
pub fn validate_address(address: &str) -> Result<()> {
    let endpoint = [addresses::TCP_PREFIX, addresses::IPC_PREFIX, addresses::INPROC_PREFIX]
        .iter()
        .find_map(|prefix| address.strip_prefix(prefix))
        .ok_or_else(|| ZmqError::InvalidAddress(address.to_string()))?;

    if endpoint.is_empty() {
        return Err(ZmqError::InvalidAddress(address.to_string()));
    }

    Ok(())
}
