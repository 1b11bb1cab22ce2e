/// ZMQ address agents push analysis records to (collector binds here)
pub const INBOUND_ADDR: &str = "tcp://127.0.0.1:60002";

/// ZMQ address of the record queue (collector binds here, sink workers connect)
pub const SINK_ADDR: &str = "ipc://sink.ipc";

/// ZMQ address of the controller command channel
pub const CONTROLLER_ADDR: &str = "tcp://127.0.0.1:59000";

/// Default number of sink workers
pub const DEFAULT_WORKERS: usize = 3;

/// Default poll interval for blocking receives, in milliseconds.
/// Bounds how long a shutdown request goes unnoticed.
pub const RECEIVE_TIMEOUT_MS: u64 = 100;
