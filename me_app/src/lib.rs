//! # me_app
//!
//! Mining engine daemon and control client wiring: configuration, logging,
//! shutdown, index bootstrap, the collector and the sink worker pool.

pub mod bootstrap;
pub mod cli;
pub mod collector;
pub mod config_loader;
pub mod control;
pub mod errors;
pub mod shutdown_handler;
pub mod sink_pool;
pub mod stats;
pub mod tracing_setup;
pub mod zmq_config;

pub use errors::EngineError;
pub use errors::Result;
