use std::time::Duration;

use bytes::Bytes;

use crate::context;
use crate::errors::Result;
use crate::errors::ZmqError;
use crate::pull::read_message;
use crate::validate_address;

/// ZeroMQ REQ socket for strict one-request/one-reply exchanges (synchronous)
pub struct Requester {
    socket: Option<zmq::Socket>,
    address: Option<String>,
}

impl Requester {
    /// Creates a new Requester instance
    pub fn new() -> Self {
        Self { socket: None, address: None }
    }

    /// Connects the requester to the specified address
    pub fn connect(&mut self, address: &str) -> Result<()> {
        validate_address(address)?;
        let socket = context().socket(zmq::REQ).map_err(|e| ZmqError::ConnectFailed { address: address.to_string(), source: e })?;

        socket.set_linger(0).map_err(ZmqError::SocketOption)?;

        socket.connect(address).map_err(|e| ZmqError::ConnectFailed { address: address.to_string(), source: e })?;

        self.socket = Some(socket);
        self.address = Some(address.to_string());
        Ok(())
    }

    /// Sends one request and waits for its reply.
    ///
    /// With `timeout` set, a missing reply fails with [`ZmqError::Timeout`] and
    /// the socket is dropped, since a REQ socket cannot send again before it
    /// has received.
    pub fn request(&mut self, data: &[u8], timeout: Option<Duration>) -> Result<Bytes> {
        let socket = self.socket.as_mut().ok_or(ZmqError::NotConnected)?;
        socket.send(data, 0).map_err(ZmqError::SendFailed)?;

        if let Some(timeout) = timeout {
            let ready = socket.poll(zmq::POLLIN, timeout.as_millis() as i64).map_err(ZmqError::ReceiveFailed)?;
            if ready == 0 {
                self.socket = None;
                return Err(ZmqError::Timeout { operation: "request".to_string(), timeout_ms: timeout.as_millis() as u64 });
            }
        }

        read_message(socket)
    }

    /// Returns the address the requester is connected to
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

impl Default for Requester {
    fn default() -> Self {
        Self::new()
    }
}
