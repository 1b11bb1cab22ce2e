use bytes::Bytes;
use me_types::Collection;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use tracing::info;

use crate::client::HttpClient;
use crate::client::HttpClientConfig;
use crate::errors::HttpError;
use crate::errors::Result;

/// Primary index holding every analysis record
pub const DEFAULT_INDEX: &str = "analysis_records";

/// Default port of the indexing backend
pub const DEFAULT_PORT: u16 = 9200;

const INVALID_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// Location of the primary index on the indexing backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    base_url: String,
    index: String,
}

impl IndexTarget {
    /// Builds a target from a host (optionally with an `http://`/`https://`
    /// scheme), a port and the primary index name. The port is always given
    /// separately; a host carrying its own port is rejected.
    pub fn new(host: &str, port: u16, index: &str) -> Result<Self> {
        validate_index_name(index)?;

        let host = host.trim().trim_end_matches('/');
        let (scheme, authority) = match host.split_once("://") {
            Some((scheme @ ("http" | "https"), authority)) => (scheme, authority),
            Some(_) => return Err(HttpError::InvalidHost(host.to_string())),
            None => ("http", host),
        };

        let has_port = match authority.strip_prefix('[') {
            Some(ipv6) => ipv6.split_once(']').is_none_or(|(_, rest)| !rest.is_empty()),
            None => authority.contains(':'),
        };

        if authority.is_empty() || authority.contains('/') || has_port {
            return Err(HttpError::InvalidHost(host.to_string()));
        }

        Ok(Self { base_url: format!("{scheme}://{authority}:{port}"), index: index.to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// `GET` target answering whether the index exists
    pub fn probe_url(&self) -> String {
        format!("{}/_cat/indices/{}", self.base_url, self.index)
    }

    /// `PUT` target creating the index
    pub fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index)
    }

    /// `POST` target storing one record of the given collection
    pub fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}/{}", self.base_url, self.index, collection.as_str())
    }
}

fn validate_index_name(name: &str) -> Result<()> {
    let invalid = |reason| Err(HttpError::InvalidIndexName { name: name.to_string(), reason });

    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        return invalid("must be lowercase");
    }
    if name.contains(INVALID_INDEX_CHARS) {
        return invalid("contains a reserved character");
    }
    if name.starts_with(['-', '_', '+']) {
        return invalid("must not start with '-', '_' or '+'");
    }
    if name == "." || name == ".." {
        return invalid("must not be '.' or '..'");
    }

    Ok(())
}

/// What the startup check found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The probe answered 200 or 201, nothing was created
    Existing,
    /// The probe failed with `probe`; a create request answered `created`
    Created { probe: StatusCode, created: StatusCode },
}

/// Result of storing one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub collection: Collection,
    pub status: StatusCode,
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Client for the primary index.
///
/// Owns its [`HttpClient`]; every sink worker builds its own instance.
pub struct IndexClient {
    client: HttpClient,
    target: IndexTarget,
}

impl IndexClient {
    pub fn new(target: IndexTarget) -> Result<Self> {
        Self::with_config(target, HttpClientConfig::default())
    }

    pub fn with_config(target: IndexTarget, config: HttpClientConfig) -> Result<Self> {
        Ok(Self { client: HttpClient::with_config(config)?, target })
    }

    pub fn target(&self) -> &IndexTarget {
        &self.target
    }

    /// Asks the backend whether the primary index exists
    pub async fn probe(&self) -> Result<StatusCode> {
        let response = self.client.get(&self.target.probe_url()).send().await?;
        let status = response.status();

        // Drain the body so the connection can be reused
        response.bytes().await?;

        debug!("Index probe for {} returned {status}", self.target.index());
        Ok(status)
    }

    /// Creates the primary index. The answer is returned but not checked.
    pub async fn create(&self) -> Result<StatusCode> {
        let response = self.client.put(&self.target.index_url()).send().await?;
        let status = response.status();
        response.bytes().await?;
        Ok(status)
    }

    /// Creates the primary index unless the probe reports it as present
    pub async fn ensure_index(&self) -> Result<BootstrapOutcome> {
        let probe = self.probe().await?;
        if probe == StatusCode::OK || probe == StatusCode::CREATED {
            info!("Index {} already present", self.target.index());
            return Ok(BootstrapOutcome::Existing);
        }

        let created = self.create().await?;
        info!("Index {} missing ({probe}), create request returned {created}", self.target.index());
        Ok(BootstrapOutcome::Created { probe, created })
    }

    /// Stores one record body in `collection`
    pub async fn write(&self, collection: Collection, body: Bytes) -> Result<WriteOutcome> {
        let response = self.client.post(&self.target.collection_url(collection)).header(CONTENT_TYPE, "application/json").body(body).send().await?;
        let status = response.status();
        response.bytes().await?;

        Ok(WriteOutcome { collection, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> IndexTarget {
        IndexTarget::new("10.0.0.5", DEFAULT_PORT, DEFAULT_INDEX).unwrap()
    }

    #[test]
    fn test_urls() {
        let target = target();
        assert_eq!(target.base_url(), "http://10.0.0.5:9200");
        assert_eq!(target.probe_url(), "http://10.0.0.5:9200/_cat/indices/analysis_records");
        assert_eq!(target.index_url(), "http://10.0.0.5:9200/analysis_records");
        assert_eq!(target.collection_url(Collection::TopologyEntries), "http://10.0.0.5:9200/analysis_records/topology_entries");
        assert_eq!(target.collection_url(Collection::MysqlBreakdowns), "http://10.0.0.5:9200/analysis_records/mysql_breakdowns");
    }

    #[test]
    fn test_host_with_scheme() {
        let target = IndexTarget::new("https://search.internal/", 443, "records").unwrap();
        assert_eq!(target.base_url(), "https://search.internal:443");

        assert!(matches!(IndexTarget::new("ftp://search", 21, "records"), Err(HttpError::InvalidHost(_))));
        assert!(matches!(IndexTarget::new("", 9200, "records"), Err(HttpError::InvalidHost(_))));
        assert!(matches!(IndexTarget::new("host/path", 9200, "records"), Err(HttpError::InvalidHost(_))));
    }

    #[test]
    fn test_host_with_port_is_rejected() {
        assert!(matches!(IndexTarget::new("10.0.0.5:9200", 9200, "records"), Err(HttpError::InvalidHost(_))));
        assert!(matches!(IndexTarget::new("http://search.internal:9200", 9200, "records"), Err(HttpError::InvalidHost(_))));
        assert!(matches!(IndexTarget::new("[::1]:9200", 9200, "records"), Err(HttpError::InvalidHost(_))));

        let target = IndexTarget::new("[::1]", 9200, "records").unwrap();
        assert_eq!(target.base_url(), "http://[::1]:9200");
    }

    #[test]
    fn test_index_name_validation() {
        for name in ["", "Analysis", "a/b", "a b", "_records", "-records", "..", "a#b"] {
            assert!(matches!(IndexTarget::new("localhost", 9200, name), Err(HttpError::InvalidIndexName { .. })), "{name} accepted");
        }

        assert!(IndexTarget::new("localhost", 9200, "analysis_records-2015").is_ok());
    }

    #[test]
    fn test_write_outcome_success() {
        let created = WriteOutcome { collection: Collection::AppServices, status: StatusCode::CREATED };
        let rejected = WriteOutcome { collection: Collection::AppServices, status: StatusCode::BAD_REQUEST };

        assert!(created.is_success());
        assert!(!rejected.is_success());
    }
}
