//! Ctrl+C handling of the `mining_engine` binary.

#![cfg(unix)]

use std::io::BufRead;
use std::io::BufReader;
use std::process::Command;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;

use me_zmq::Pusher;

fn wait_for_exit(child: &mut std::process::Child, timeout: Duration) -> Option<std::process::ExitStatus> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().unwrap() {
            return Some(status);
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    None
}

#[test]
fn test_sigint_while_waiting_for_records_exits_cleanly() {
    let inbound = "tcp://127.0.0.1:19500";
    let log_dir = std::env::temp_dir().join(format!("mining_engine_interrupt_{}", std::process::id()));

    let mut engine = Command::new(env!("CARGO_BIN_EXE_mining_engine"))
        .args(["--inbound", inbound, "--sink", "ipc:///tmp/mining_engine_interrupt_sink.ipc", "--log-dir"])
        .arg(&log_dir)
        .env_remove("MINING_ENGINE__ES_HOST")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // Print mode echoes the record once the collector is running
    let mut agent = Pusher::new();
    agent.connect(inbound).unwrap();
    agent.push(br#"{"type":"TOPOLOGY_ENTRY"}"#).unwrap();

    let mut stdout = BufReader::new(engine.stdout.take().unwrap());
    let mut line = String::new();
    stdout.read_line(&mut line).unwrap();
    assert_eq!(line, "{\"type\":\"TOPOLOGY_ENTRY\"}\n");

    // Let the collector block in its receive poll before interrupting
    std::thread::sleep(Duration::from_millis(300));
    let killed = Command::new("kill").args(["-INT", &engine.id().to_string()]).status().unwrap();
    assert!(killed.success());

    let status = match wait_for_exit(&mut engine, Duration::from_secs(10)) {
        Some(status) => status,
        None => {
            engine.kill().unwrap();
            panic!("mining_engine did not stop after SIGINT");
        }
    };
    assert_eq!(status.code(), Some(0));

    let _ = std::fs::remove_dir_all(&log_dir);
}
