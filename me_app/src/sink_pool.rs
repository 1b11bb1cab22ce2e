use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::Duration;

use bytes::Bytes;
use me_http::IndexClient;
use me_http::IndexTarget;
use me_http::WriteOutcome;
use me_types::Collection;
use me_types::ProtocolFieldPolicy;
use me_types::Record;
use me_zmq::Puller;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config_loader::EngineConfig;
use crate::errors::Result;
use crate::shutdown_handler::Shutdown;
use crate::stats::PipelineStats;

/// Storage side of a sink worker
#[allow(async_fn_in_trait)]
pub trait RecordWriter {
    async fn write(&self, collection: Collection, body: Bytes) -> me_http::Result<WriteOutcome>;
}

impl RecordWriter for IndexClient {
    async fn write(&self, collection: Collection, body: Bytes) -> me_http::Result<WriteOutcome> {
        IndexClient::write(self, collection, body).await
    }
}

/// Classifies records and stores each routed one with exactly one write
pub struct SinkWorker<W> {
    id: usize,
    writer: W,
    policy: ProtocolFieldPolicy,
    stats: Arc<PipelineStats>,
}

impl<W: RecordWriter> SinkWorker<W> {
    pub fn new(id: usize, writer: W, policy: ProtocolFieldPolicy, stats: Arc<PipelineStats>) -> Self {
        Self { id, writer, policy, stats }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Handles one record.
    ///
    /// Returns `Ok(None)` when the record type has no destination. A malformed
    /// record or a failed request is returned as an error; the write result
    /// itself is only logged.
    pub async fn handle(&self, record: Record) -> Result<Option<WriteOutcome>> {
        debug!("[worker {}] {}", self.id, String::from_utf8_lossy(record.payload()));

        let Some(kind) = record.classify(self.policy)? else {
            self.stats.record_dropped();
            return Ok(None);
        };

        let collection = kind.collection();
        let outcome = self.writer.write(collection, record.into_payload()).await?;

        if outcome.is_success() {
            self.stats.record_written();
            info!("[worker {}] {collection}: {}", self.id, outcome.status);
        } else {
            self.stats.record_rejected();
            warn!("[worker {}] {collection}: {}", self.id, outcome.status);
        }

        Ok(Some(outcome))
    }
}

/// Settings shared by all workers of a pool
#[derive(Debug, Clone)]
pub struct SinkPoolConfig {
    pub sink_address: String,
    pub workers: usize,
    pub receive_timeout: Duration,
    pub policy: ProtocolFieldPolicy,
}

impl From<&EngineConfig> for SinkPoolConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            sink_address: config.sink_address.clone(),
            workers: config.workers,
            receive_timeout: config.receive_timeout(),
            policy: config.protocol_fields,
        }
    }
}

/// Fixed-size set of sink worker threads.
///
/// Each worker owns its queue connection, its HTTP client and a
/// single-threaded runtime. A worker that hits a fatal error stops for good;
/// the pool keeps running with the remaining ones.
pub struct SinkPool {
    workers: Vec<JoinHandle<Result<()>>>,
    live: Arc<AtomicUsize>,
}

impl SinkPool {
    pub fn spawn(config: SinkPoolConfig, target: IndexTarget, stats: Arc<PipelineStats>, shutdown: Shutdown) -> Result<Self> {
        let live = Arc::new(AtomicUsize::new(0));
        let mut workers = Vec::with_capacity(config.workers);

        for id in 0..config.workers {
            let config = config.clone();
            let target = target.clone();
            let stats = Arc::clone(&stats);
            let shutdown = shutdown.clone();
            let live_guard = LiveWorker::register(Arc::clone(&live));

            let handle = std::thread::Builder::new().name(format!("sink-worker-{id}")).spawn(move || {
                let _live = live_guard;
                let result = run_worker(id, &config, target, stats, &shutdown);
                if let Err(err) = &result {
                    error!("[worker {id}] fatal error, worker stopped: {err}");
                }
                result
            })?;

            workers.push(handle);
        }

        info!("Sink pool started with {} workers", config.workers);
        Ok(Self { workers, live })
    }

    /// Number of workers the pool was started with
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Number of workers still running
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Waits for every worker and returns how many ended with an error
    pub fn join(self) -> usize {
        let mut failed = 0;
        for (id, handle) in self.workers.into_iter().enumerate() {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(_)) => failed += 1,
                Err(_) => {
                    error!("[worker {id}] panicked");
                    failed += 1;
                }
            }
        }
        failed
    }
}

/// Counts a worker as live until dropped
struct LiveWorker(Arc<AtomicUsize>);

impl LiveWorker {
    fn register(live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self(live)
    }
}

impl Drop for LiveWorker {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn run_worker(id: usize, config: &SinkPoolConfig, target: IndexTarget, stats: Arc<PipelineStats>, shutdown: &Shutdown) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let client = IndexClient::new(target)?;

    let mut queue = Puller::new();
    queue.connect(&config.sink_address)?;
    info!("[worker {id}] connected to {}", config.sink_address);

    let worker = SinkWorker::new(id, client, config.policy, stats);

    while shutdown.is_running() {
        let Some(data) = queue.receive_timeout(config.receive_timeout)? else {
            continue;
        };
        runtime.block_on(worker.handle(Record::new(data)))?;
    }

    info!("[worker {id}] exiting");
    Ok(())
}
