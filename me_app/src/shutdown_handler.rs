use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Cancellation context shared by the collector and every sink worker.
///
/// Loops check [`Shutdown::is_running`] between iterations; an iteration that
/// has started always runs to completion.
#[derive(Debug, Clone)]
pub struct Shutdown {
    running: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self { running: Arc::new(AtomicBool::new(true)) }
    }

    /// Sets up a Ctrl+C handler that stops every holder of this context
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let running = Arc::clone(&self.running);
        ctrlc::set_handler(move || {
            tracing::info!("Shutdown signal received");
            running.store(false, Ordering::Relaxed);
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Requests shutdown without a signal, e.g. after a fatal error
    pub fn trigger(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
