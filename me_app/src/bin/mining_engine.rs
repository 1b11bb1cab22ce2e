use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use me_app::bootstrap;
use me_app::bootstrap::IndexingMode;
use me_app::cli::EngineArgs;
use me_app::collector::Collector;
use me_app::collector::Dispatch;
use me_app::collector::LocalSink;
use me_app::config_loader;
use me_app::config_loader::EngineConfig;
use me_app::shutdown_handler::Shutdown;
use me_app::sink_pool::SinkPool;
use me_app::sink_pool::SinkPoolConfig;
use me_app::stats::PipelineStats;
use me_app::tracing_setup;
use me_zmq::Pusher;
use tracing::error;
use tracing::info;
use tracing::warn;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = EngineArgs::parse();

    let config = match config_loader::load_engine_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    // CRITICAL: Keep guard alive for entire application lifetime
    let _guard = tracing_setup::init_with_console("mining_engine", &config.log_dir, tracing::Level::INFO);

    match run(config) {
        Ok(()) => {
            info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Mining engine stopped on fatal error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: EngineConfig) -> me_app::Result<()> {
    let shutdown = Shutdown::new();
    shutdown.install()?;

    let stats = Arc::new(PipelineStats::default());

    let mode = bootstrap::resolve_blocking(config.index_target()?)?;

    let (dispatch, pool) = match mode {
        IndexingMode::Enabled(target) => {
            let mut queue = Pusher::new();
            queue.bind(&config.sink_address)?;
            info!("Record queue bound to {}", config.sink_address);

            let pool = SinkPool::spawn(SinkPoolConfig::from(&config), target, Arc::clone(&stats), shutdown.clone())?;
            (Dispatch::Forward(queue), Some(pool))
        }
        IndexingMode::Disabled => (Dispatch::Print(LocalSink::stdout()), None),
    };

    let result = Collector::bind(&config.inbound_address, dispatch, Arc::clone(&stats), config.receive_timeout())
        .and_then(|mut collector| collector.run(&shutdown, pool.as_ref()));

    // Stop the workers whether the collector ended cleanly or not
    shutdown.trigger();
    if let Some(pool) = pool {
        let failed = pool.join();
        if failed > 0 {
            warn!("{failed} sink workers ended with an error");
        }
    }

    info!("Pipeline totals: {}", stats.snapshot());
    result
}
