use std::io;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use me_types::Record;
use me_zmq::Puller;
use me_zmq::Pusher;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::errors::EngineError;
use crate::errors::Result;
use crate::shutdown_handler::Shutdown;
use crate::sink_pool::SinkPool;
use crate::stats::PipelineStats;

/// Destination for records while indexing is disabled: one record per line
pub struct LocalSink {
    out: Box<dyn Write + Send>,
}

impl LocalSink {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn emit(&mut self, record: &Record) -> io::Result<()> {
        self.out.write_all(record.payload())?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

/// Where the collector sends each record
pub enum Dispatch {
    /// Hand the record to the sink workers through the record queue
    Forward(Pusher),
    /// Print the record, no network write
    Print(LocalSink),
}

/// Receives records from agents and dispatches each one unchanged
pub struct Collector {
    inbound: Puller,
    dispatch: Dispatch,
    stats: Arc<PipelineStats>,
    receive_timeout: Duration,
    pending: Option<Record>,
}

impl Collector {
    /// Binds the inbound endpoint
    pub fn bind(address: &str, dispatch: Dispatch, stats: Arc<PipelineStats>, receive_timeout: Duration) -> Result<Self> {
        let mut inbound = Puller::new();
        inbound.bind(address)?;

        let mode = match dispatch {
            Dispatch::Forward(_) => "forwarding to sink workers",
            Dispatch::Print(_) => "printing locally",
        };
        info!("Collector bound to {address}, {mode}");

        Ok(Self { inbound, dispatch, stats, receive_timeout, pending: None })
    }

    /// Forwards or prints one record.
    ///
    /// A forward waits at most the receive timeout for a sink worker to take
    /// the record. If none does, the record is kept and retried by the next
    /// [`Collector::poll_once`], and `false` is returned.
    pub fn dispatch(&mut self, record: Record) -> Result<bool> {
        match &mut self.dispatch {
            Dispatch::Forward(queue) => {
                if !queue.push_timeout(record.payload(), self.receive_timeout)? {
                    debug!("No sink worker took the record, retrying");
                    self.pending = Some(record);
                    return Ok(false);
                }
                self.stats.record_forwarded();
            }
            Dispatch::Print(sink) => {
                sink.emit(&record)?;
                self.stats.record_printed();
            }
        }

        Ok(true)
    }

    /// Retries the pending record, or waits up to the receive timeout for a
    /// new one and dispatches it. Returns whether a record was delivered.
    pub fn poll_once(&mut self) -> Result<bool> {
        if let Some(record) = self.pending.take() {
            return self.dispatch(record);
        }

        match self.inbound.receive_timeout(self.receive_timeout)? {
            Some(data) => {
                self.stats.record_received();
                self.dispatch(Record::new(data))
            }
            None => Ok(false),
        }
    }

    /// Runs until `shutdown` is triggered.
    ///
    /// Any receive or dispatch error ends the loop and is returned to the
    /// caller. With a sink pool attached, the loop also fails once every
    /// worker has stopped, since nothing could consume the queue any more.
    pub fn run(&mut self, shutdown: &Shutdown, pool: Option<&SinkPool>) -> Result<()> {
        while shutdown.is_running() {
            if let Some(pool) = pool
                && pool.live_workers() == 0
            {
                return Err(EngineError::SinkPoolExhausted(pool.size()));
            }

            self.poll_once()?;
        }

        if self.pending.is_some() {
            warn!("Collector stopped with one record not yet handed to a sink worker");
        }

        debug!("Collector loop stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU16;
    use std::sync::atomic::Ordering;

    use parking_lot::Mutex;

    use super::*;

    static PORT_COUNTER: AtomicU16 = AtomicU16::new(17_000);

    fn get_test_address() -> String {
        format!("tcp://127.0.0.1:{}", PORT_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn agent(address: &str) -> Pusher {
        let mut agent = Pusher::new();
        agent.connect(address).unwrap();
        agent
    }

    #[test]
    fn test_print_mode_emits_record_lines() {
        let address = get_test_address();
        let buffer = SharedBuffer::default();
        let stats = Arc::new(PipelineStats::default());

        let mut collector =
            Collector::bind(&address, Dispatch::Print(LocalSink::new(buffer.clone())), Arc::clone(&stats), Duration::from_millis(2_000)).unwrap();

        let mut agent = agent(&address);
        agent.push(br#"{"type":"TOPOLOGY_ENTRY"}"#).unwrap();
        agent.push(br#"{"type":"UNKNOWN_KIND"}"#).unwrap();

        assert!(collector.poll_once().unwrap());
        assert!(collector.poll_once().unwrap());

        let printed = String::from_utf8(buffer.0.lock().clone()).unwrap();
        assert_eq!(printed, "{\"type\":\"TOPOLOGY_ENTRY\"}\n{\"type\":\"UNKNOWN_KIND\"}\n");

        let snapshot = stats.snapshot();
        assert_eq!((snapshot.received, snapshot.printed, snapshot.forwarded), (2, 2, 0));
    }

    #[test]
    fn test_forward_mode_pushes_unchanged_record() {
        let inbound = get_test_address();
        let queue_address = get_test_address();
        let stats = Arc::new(PipelineStats::default());

        let mut queue = Pusher::new();
        queue.bind(&queue_address).unwrap();
        let mut worker_side = Puller::new();
        worker_side.connect(&queue_address).unwrap();

        let mut collector = Collector::bind(&inbound, Dispatch::Forward(queue), Arc::clone(&stats), Duration::from_millis(2_000)).unwrap();

        let record = br#"{"type":"TCP_BREAKDOWN","proto":"HTTP"}"#;
        agent(&inbound).push(record).unwrap();

        assert!(collector.poll_once().unwrap());

        let forwarded = worker_side.receive_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(&forwarded[..], &record[..]);
        assert_eq!(stats.snapshot().forwarded, 1);
    }

    #[test]
    fn test_forward_without_worker_keeps_record_for_retry() {
        let inbound = get_test_address();
        let queue_address = get_test_address();
        let stats = Arc::new(PipelineStats::default());

        let mut queue = Pusher::new();
        queue.bind(&queue_address).unwrap();
        let mut collector = Collector::bind(&inbound, Dispatch::Forward(queue), Arc::clone(&stats), Duration::from_millis(50)).unwrap();

        let record = br#"{"type":"APP_SERVICE"}"#;
        agent(&inbound).push(record).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while stats.snapshot().received == 0 && std::time::Instant::now() < deadline {
            assert!(!collector.poll_once().unwrap());
        }
        assert_eq!((stats.snapshot().received, stats.snapshot().forwarded), (1, 0));

        let mut worker_side = Puller::new();
        worker_side.connect(&queue_address).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !collector.poll_once().unwrap() && std::time::Instant::now() < deadline {}

        let forwarded = worker_side.receive_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(&forwarded[..], &record[..]);
        assert_eq!((stats.snapshot().received, stats.snapshot().forwarded), (1, 1));
    }

    #[test]
    fn test_run_stops_on_shutdown_while_no_worker_takes_records() {
        let inbound = get_test_address();
        let stats = Arc::new(PipelineStats::default());

        let mut queue = Pusher::new();
        queue.bind("inproc://collector-stalled-queue").unwrap();
        let mut collector = Collector::bind(&inbound, Dispatch::Forward(queue), Arc::clone(&stats), Duration::from_millis(20)).unwrap();
        agent(&inbound).push(br#"{"type":"TOPOLOGY_ENTRY"}"#).unwrap();

        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(300));
            trigger.trigger();
        });

        assert!(collector.run(&shutdown, None).is_ok());
        stopper.join().unwrap();
        assert_eq!(stats.snapshot().forwarded, 0);
    }

    #[test]
    fn test_poll_once_times_out_quietly() {
        let address = get_test_address();
        let stats = Arc::new(PipelineStats::default());
        let mut collector = Collector::bind(&address, Dispatch::Print(LocalSink::new(io::sink())), stats, Duration::from_millis(10)).unwrap();

        assert!(!collector.poll_once().unwrap());
    }

    #[test]
    fn test_run_returns_after_shutdown() {
        let address = get_test_address();
        let stats = Arc::new(PipelineStats::default());
        let mut collector = Collector::bind(&address, Dispatch::Print(LocalSink::new(io::sink())), stats, Duration::from_millis(10)).unwrap();

        let shutdown = Shutdown::new();
        shutdown.trigger();
        assert!(collector.run(&shutdown, None).is_ok());
    }

    #[test]
    fn test_bind_invalid_address_fails() {
        let stats = Arc::new(PipelineStats::default());
        let result = Collector::bind("localhost:60002", Dispatch::Print(LocalSink::new(io::sink())), stats, Duration::from_millis(10));
        assert!(matches!(result, Err(EngineError::Zmq(_))));
    }
}
