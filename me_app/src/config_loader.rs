use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use me_http::HttpError;
use me_http::IndexTarget;
use me_http::index::DEFAULT_INDEX;
use me_http::index::DEFAULT_PORT;
use me_types::ProtocolFieldPolicy;
use serde::Deserialize;

use crate::cli::EngineArgs;
use crate::zmq_config;

/// Prefix of environment overrides, e.g. `MINING_ENGINE__ES_HOST`
pub const ENV_PREFIX: &str = "MINING_ENGINE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    pub inbound_address: String,
    pub sink_address: String,
    /// Indexing is disabled when unset
    pub es_host: Option<String>,
    pub es_port: u16,
    pub index_name: String,
    pub workers: usize,
    pub receive_timeout_ms: u64,
    pub protocol_fields: ProtocolFieldPolicy,
    pub log_dir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inbound_address: zmq_config::INBOUND_ADDR.to_string(),
            sink_address: zmq_config::SINK_ADDR.to_string(),
            es_host: None,
            es_port: DEFAULT_PORT,
            index_name: DEFAULT_INDEX.to_string(),
            workers: zmq_config::DEFAULT_WORKERS,
            receive_timeout_ms: zmq_config::RECEIVE_TIMEOUT_MS,
            protocol_fields: ProtocolFieldPolicy::Strict,
            log_dir: "./logs".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// Backend location, or `None` when no host is configured
    pub fn index_target(&self) -> Result<Option<IndexTarget>, HttpError> {
        match self.es_host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => IndexTarget::new(host, self.es_port, &self.index_name).map(Some),
            _ => Ok(None),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Message("workers must be at least 1".to_string()));
        }
        if self.receive_timeout_ms == 0 {
            return Err(ConfigError::Message("receive_timeout_ms must be at least 1".to_string()));
        }
        if self.inbound_address.trim().is_empty() || self.sink_address.trim().is_empty() {
            return Err(ConfigError::Message("inbound_address and sink_address must be set".to_string()));
        }
        Ok(())
    }
}

/// Loads the engine configuration.
///
/// Later sources win: built-in defaults, the optional config file,
/// `MINING_ENGINE__*` environment variables, then command-line flags.
pub fn load_engine_config(args: &EngineArgs) -> Result<EngineConfig, ConfigError> {
    let defaults = EngineConfig::default();

    let mut builder = Config::builder()
        .set_default("inbound_address", defaults.inbound_address)?
        .set_default("sink_address", defaults.sink_address)?
        .set_default("es_port", i64::from(defaults.es_port))?
        .set_default("index_name", defaults.index_name)?
        .set_default("workers", defaults.workers as i64)?
        .set_default("receive_timeout_ms", defaults.receive_timeout_ms as i64)?
        .set_default("protocol_fields", "strict")?
        .set_default("log_dir", defaults.log_dir)?;

    if let Some(path) = &args.config {
        builder = builder.add_source(File::from(path.as_path()));
    }

    let config = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
        .set_override_option("es_host", args.ip.clone())?
        .set_override_option("es_port", args.es_port.map(i64::from))?
        .set_override_option("inbound_address", args.inbound.clone())?
        .set_override_option("sink_address", args.sink.clone())?
        .set_override_option("workers", args.workers.map(|workers| workers as i64))?
        .set_override_option("log_dir", args.log_dir.clone())?
        .build()?;

    let config: EngineConfig = config.try_deserialize()?;
    config.validate()?;

    tracing::debug!("Loaded engine config: {config:?}");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = load_engine_config(&EngineArgs::default()).unwrap();

        assert_eq!(config.inbound_address, "tcp://127.0.0.1:60002");
        assert_eq!(config.sink_address, "ipc://sink.ipc");
        assert_eq!(config.es_port, 9200);
        assert_eq!(config.index_name, "analysis_records");
        assert_eq!(config.workers, 3);
        assert_eq!(config.protocol_fields, ProtocolFieldPolicy::Strict);
        assert_eq!(config.receive_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_no_host_disables_indexing() {
        let config = EngineConfig::default();
        assert_eq!(config.index_target().unwrap(), None);

        let blank = EngineConfig { es_host: Some("  ".to_string()), ..EngineConfig::default() };
        assert_eq!(blank.index_target().unwrap(), None);
    }

    #[test]
    fn test_cli_overrides() {
        let args = EngineArgs { ip: Some("10.0.0.5".to_string()), workers: Some(6), sink: Some("tcp://127.0.0.1:5557".to_string()), ..Default::default() };
        let config = load_engine_config(&args).unwrap();

        assert_eq!(config.es_host.as_deref(), Some("10.0.0.5"));
        assert_eq!(config.workers, 6);
        assert_eq!(config.sink_address, "tcp://127.0.0.1:5557");

        let target = config.index_target().unwrap().unwrap();
        assert_eq!(target.base_url(), "http://10.0.0.5:9200");
        assert_eq!(target.index(), "analysis_records");
    }

    #[test]
    fn test_file_source_and_cli_precedence() {
        let path = std::env::temp_dir().join(format!("mining_engine_{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "es_host = \"search.internal\"\nworkers = 8\nprotocol_fields = \"lenient\"").unwrap();

        let args = EngineArgs { config: Some(path.clone()), workers: Some(2), ..Default::default() };
        let config = load_engine_config(&args).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.es_host.as_deref(), Some("search.internal"));
        assert_eq!(config.workers, 2);
        assert_eq!(config.protocol_fields, ProtocolFieldPolicy::Lenient);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let args = EngineArgs { workers: Some(0), ..Default::default() };
        assert!(load_engine_config(&args).is_err());
    }
}
