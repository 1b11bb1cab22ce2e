use std::time::Duration;

use crate::context;
use crate::errors::Result;
use crate::errors::ZmqError;
use crate::validate_address;

/// ZeroMQ PUSH socket handing messages to connected pullers round-robin (synchronous)
pub struct Pusher {
    socket: Option<zmq::Socket>,
    address: Option<String>,
}

impl Pusher {
    /// Creates a new Pusher instance
    pub fn new() -> Self {
        Self { socket: None, address: None }
    }

    /// Binds the pusher to the specified address
    pub fn bind(&mut self, address: &str) -> Result<()> {
        validate_address(address)?;
        let socket = Self::open().map_err(|e| ZmqError::BindFailed { address: address.to_string(), source: e })?;

        socket.bind(address).map_err(|e| ZmqError::BindFailed { address: address.to_string(), source: e })?;

        self.socket = Some(socket);
        self.address = Some(address.to_string());
        Ok(())
    }

    /// Connects the pusher to the specified address
    pub fn connect(&mut self, address: &str) -> Result<()> {
        validate_address(address)?;
        let socket = Self::open().map_err(|e| ZmqError::ConnectFailed { address: address.to_string(), source: e })?;

        socket.connect(address).map_err(|e| ZmqError::ConnectFailed { address: address.to_string(), source: e })?;

        self.socket = Some(socket);
        self.address = Some(address.to_string());
        Ok(())
    }

    fn open() -> std::result::Result<zmq::Socket, zmq::Error> {
        let socket = context().socket(zmq::PUSH)?;

        // Set linger to 0 for immediate cleanup
        socket.set_linger(0)?;

        // No high water mark: the queue is unbounded so a send never blocks on
        // a slow consumer
        socket.set_sndhwm(0)?;

        Ok(socket)
    }

    /// Pushes one message to the next available puller, blocking until one is connected
    pub fn push(&mut self, data: &[u8]) -> Result<()> {
        let socket = self.socket.as_mut().ok_or(ZmqError::NotConnected)?;
        socket.send(data, 0).map_err(ZmqError::SendFailed)?;
        Ok(())
    }

    /// Pushes one message if a puller can take it within `timeout`.
    ///
    /// Returns `false` when no puller is connected in time or the wait was
    /// interrupted by a signal; the message is not queued in that case.
    pub fn push_timeout(&mut self, data: &[u8], timeout: Duration) -> Result<bool> {
        let socket = self.socket.as_mut().ok_or(ZmqError::NotConnected)?;

        match socket.poll(zmq::POLLOUT, timeout.as_millis() as i64) {
            Ok(0) | Err(zmq::Error::EINTR) => return Ok(false),
            Ok(_) => {}
            Err(e) => return Err(ZmqError::SendFailed(e)),
        }

        match socket.send(data, zmq::DONTWAIT) {
            Ok(()) => Ok(true),
            Err(zmq::Error::EAGAIN | zmq::Error::EINTR) => Ok(false),
            Err(e) => Err(ZmqError::SendFailed(e)),
        }
    }

    /// Returns the address the pusher is bound/connected to
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

impl Default for Pusher {
    fn default() -> Self {
        Self::new()
    }
}
