use std::time::Duration;

use bytes::Bytes;

use crate::context;
use crate::errors::Result;
use crate::errors::ZmqError;
use crate::validate_address;

/// ZeroMQ PULL socket receiving messages from pushers (synchronous)
pub struct Puller {
    socket: Option<zmq::Socket>,
    address: Option<String>,
}

impl Puller {
    /// Creates a new Puller instance
    pub fn new() -> Self {
        Self { socket: None, address: None }
    }

    /// Connects the puller to the specified address
    pub fn connect(&mut self, address: &str) -> Result<()> {
        validate_address(address)?;
        let socket = Self::open().map_err(|e| ZmqError::ConnectFailed { address: address.to_string(), source: e })?;

        socket.connect(address).map_err(|e| ZmqError::ConnectFailed { address: address.to_string(), source: e })?;

        self.socket = Some(socket);
        self.address = Some(address.to_string());
        Ok(())
    }

    /// Binds the puller to the specified address
    pub fn bind(&mut self, address: &str) -> Result<()> {
        validate_address(address)?;
        let socket = Self::open().map_err(|e| ZmqError::BindFailed { address: address.to_string(), source: e })?;

        socket.bind(address).map_err(|e| ZmqError::BindFailed { address: address.to_string(), source: e })?;

        self.socket = Some(socket);
        self.address = Some(address.to_string());
        Ok(())
    }

    fn open() -> std::result::Result<zmq::Socket, zmq::Error> {
        let socket = context().socket(zmq::PULL)?;

        // Set linger to 0 for immediate cleanup
        socket.set_linger(0)?;

        Ok(socket)
    }

    /// Receives one message, blocking until it arrives
    pub fn receive(&mut self) -> Result<Bytes> {
        let socket = self.socket.as_mut().ok_or(ZmqError::NotConnected)?;
        read_message(socket)
    }

    /// Receives one message, returning `None` if nothing arrived within `timeout`.
    ///
    /// A wait interrupted by a signal also returns `None`, leaving the caller
    /// free to check its shutdown flag.
    pub fn receive_timeout(&mut self, timeout: Duration) -> Result<Option<Bytes>> {
        let socket = self.socket.as_mut().ok_or(ZmqError::NotConnected)?;

        match socket.poll(zmq::POLLIN, timeout.as_millis() as i64) {
            Ok(0) | Err(zmq::Error::EINTR) => Ok(None),
            Ok(_) => read_message(socket).map(Some),
            Err(e) => Err(ZmqError::ReceiveFailed(e)),
        }
    }

    /// Returns the address the puller is connected/bound to
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

impl Default for Puller {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads all frames of one message and keeps the last one as the payload
pub(crate) fn read_message(socket: &mut zmq::Socket) -> Result<Bytes> {
    let mut parts = Vec::new();
    loop {
        let msg = match socket.recv_msg(0) {
            Ok(msg) => msg,
            Err(zmq::Error::EINTR) => continue,
            Err(e) => return Err(ZmqError::ReceiveFailed(e)),
        };
        parts.push(msg);

        if !socket.get_rcvmore().unwrap_or(false) {
            break;
        }
    }

    let data = parts.into_iter().last().ok_or(ZmqError::EmptyMessage)?;

    Ok(Bytes::copy_from_slice(&data))
}
