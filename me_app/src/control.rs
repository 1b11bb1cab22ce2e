use std::time::Duration;

use me_types::Command;
use me_zmq::Requester;
use tracing::debug;

use crate::errors::Result;

/// Sends one command envelope and returns the controller's reply verbatim
pub fn send_command(endpoint: &str, command: &Command, timeout: Option<Duration>) -> Result<String> {
    let envelope = command.to_json()?;

    let mut requester = Requester::new();
    requester.connect(endpoint)?;
    debug!("Sending {} to {endpoint}", command.name());

    let reply = requester.request(envelope.as_bytes(), timeout)?;
    Ok(String::from_utf8_lossy(&reply).into_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU16;
    use std::sync::atomic::Ordering;

    use me_zmq::ZmqError;

    use super::*;
    use crate::errors::EngineError;

    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18_000);

    fn get_test_address() -> String {
        format!("tcp://127.0.0.1:{}", PORT_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Answers every request on `address` with `reply` and returns what it received
    fn spawn_controller(address: &str, replies: usize, reply: &'static str) -> std::thread::JoinHandle<Vec<String>> {
        let context = zmq::Context::new();
        let socket = context.socket(zmq::REP).unwrap();
        socket.bind(address).unwrap();

        std::thread::spawn(move || {
            let mut received = Vec::new();
            for _ in 0..replies {
                let request = socket.recv_string(0).unwrap().unwrap();
                received.push(request);
                socket.send(reply, 0).unwrap();
            }
            received
        })
    }

    #[test]
    fn test_pause_gets_exactly_one_reply() {
        let address = get_test_address();
        let controller = spawn_controller(&address, 1, r#"{"code":0,"body":{}}"#);

        let reply = send_command(&address, &Command::pause(), Some(Duration::from_secs(5))).unwrap();
        assert_eq!(reply, r#"{"code":0,"body":{}}"#);

        let received = controller.join().unwrap();
        assert_eq!(received, vec![r#"{"command":"pause","body":{}}"#.to_string()]);
    }

    #[test]
    fn test_add_agent_envelope_on_the_wire() {
        let address = get_test_address();
        let controller = spawn_controller(&address, 1, "{}");

        send_command(&address, &Command::add_agent("12345", "127.0.0.1", 59009), Some(Duration::from_secs(5))).unwrap();

        let received = controller.join().unwrap();
        let sent: serde_json::Value = serde_json::from_str(&received[0]).unwrap();
        assert_eq!(sent["command"], "add-agent");
        assert_eq!(sent["body"]["agent-id"], "12345");
        assert_eq!(sent["body"]["port"], 59009);
    }

    #[test]
    fn test_silent_controller_times_out() {
        let address = get_test_address();
        let context = zmq::Context::new();
        let socket = context.socket(zmq::REP).unwrap();
        socket.bind(&address).unwrap();

        let err = send_command(&address, &Command::resume(), Some(Duration::from_millis(50))).unwrap_err();
        assert!(matches!(err, EngineError::Zmq(ZmqError::Timeout { .. })));
    }
}
