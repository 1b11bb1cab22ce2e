use std::fmt;

use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;
use simd_json::BorrowedValue;
use simd_json::prelude::ValueAsScalar;
use tracing::trace;
use tracing::warn;

use crate::errors::RecordError;
use crate::errors::Result;

/// Field carrying the record discriminator
pub const TYPE_FIELD: &str = "type";

/// Sub-discriminator field used by `DEFAULT` and `HTTP` breakdowns
pub const PROTO_FIELD: &str = "proto";

/// Sub-discriminator field used by `MYSQL` breakdowns
pub const PROTOCOL_FIELD: &str = "protocol";

/// One analysis record as received from an upstream agent.
///
/// The payload is kept exactly as it arrived so the storage write carries the
/// same JSON body. A record is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    payload: Bytes,
}

impl Record {
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Classifies the record by its declared type.
    ///
    /// `Ok(None)` means the type (or TCP sub-type) is not routed anywhere and the
    /// record is to be dropped. Errors are reserved for payloads that cannot be
    /// inspected at all.
    pub fn classify(&self, policy: ProtocolFieldPolicy) -> Result<Option<RecordKind>> {
        classify(&self.payload, policy)
    }
}

impl From<Bytes> for Record {
    fn from(payload: Bytes) -> Self {
        Self::new(payload)
    }
}

impl From<&'static str> for Record {
    fn from(payload: &'static str) -> Self {
        Self::new(Bytes::from_static(payload.as_bytes()))
    }
}

/// Application protocol of a `TCP_BREAKDOWN` record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TcpProtocol {
    Default,
    Http,
    Mysql,
}

impl TcpProtocol {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "DEFAULT" => Some(TcpProtocol::Default),
            "HTTP" => Some(TcpProtocol::Http),
            "MYSQL" => Some(TcpProtocol::Mysql),
            _ => None,
        }
    }

    /// The field agents use for this protocol today
    pub fn canonical_field(self) -> &'static str {
        match self {
            TcpProtocol::Default | TcpProtocol::Http => PROTO_FIELD,
            TcpProtocol::Mysql => PROTOCOL_FIELD,
        }
    }
}

/// Declared record variants that have a storage destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    TopologyEntry,
    AppService,
    IcmpBreakdown,
    TcpBreakdown(TcpProtocol),
}

impl RecordKind {
    pub fn collection(self) -> Collection {
        match self {
            RecordKind::TopologyEntry => Collection::TopologyEntries,
            RecordKind::AppService => Collection::AppServices,
            RecordKind::IcmpBreakdown => Collection::IcmpBreakdowns,
            RecordKind::TcpBreakdown(TcpProtocol::Default) => Collection::DefaultBreakdowns,
            RecordKind::TcpBreakdown(TcpProtocol::Http) => Collection::HttpBreakdowns,
            RecordKind::TcpBreakdown(TcpProtocol::Mysql) => Collection::MysqlBreakdowns,
        }
    }
}

/// Type collection inside the primary index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    TopologyEntries,
    AppServices,
    IcmpBreakdowns,
    DefaultBreakdowns,
    HttpBreakdowns,
    MysqlBreakdowns,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::TopologyEntries => "topology_entries",
            Collection::AppServices => "app_services",
            Collection::IcmpBreakdowns => "icmp_breakdowns",
            Collection::DefaultBreakdowns => "default_breakdowns",
            Collection::HttpBreakdowns => "http_breakdowns",
            Collection::MysqlBreakdowns => "mysql_breakdowns",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which field names are honoured for the TCP breakdown sub-discriminator.
///
/// Agents send `proto` for `DEFAULT`/`HTTP` and `protocol` for `MYSQL`.
/// `Strict` accepts only that combination. `Lenient` accepts either field for
/// every protocol and warns whenever the non-canonical one was needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolFieldPolicy {
    #[default]
    Strict,
    Lenient,
}

/// Classifies a raw JSON record
pub fn classify(raw: &[u8], policy: ProtocolFieldPolicy) -> Result<Option<RecordKind>> {
    let mut bytes = raw.to_vec();
    let parsed = simd_json::to_borrowed_value(&mut bytes)?;

    let BorrowedValue::Object(object) = &parsed else {
        return Err(RecordError::NotAnObject);
    };

    let record_type = object.get(TYPE_FIELD).ok_or(RecordError::MissingField(TYPE_FIELD))?;

    let kind = match record_type.as_str() {
        Some("TOPOLOGY_ENTRY") => Some(RecordKind::TopologyEntry),
        Some("APP_SERVICE") => Some(RecordKind::AppService),
        Some("ICMP_BREAKDOWN") => Some(RecordKind::IcmpBreakdown),
        Some("TCP_BREAKDOWN") => {
            let proto = object.get(PROTO_FIELD).and_then(|value| value.as_str());
            let protocol = object.get(PROTOCOL_FIELD).and_then(|value| value.as_str());
            tcp_protocol(proto, protocol, policy).map(RecordKind::TcpBreakdown)
        }
        _ => None,
    };

    if kind.is_none() {
        trace!("Unrouted record type {:?}", record_type.as_str());
    }

    Ok(kind)
}

fn tcp_protocol(proto: Option<&str>, protocol: Option<&str>, policy: ProtocolFieldPolicy) -> Option<TcpProtocol> {
    match policy {
        ProtocolFieldPolicy::Strict => match proto {
            Some("DEFAULT") => Some(TcpProtocol::Default),
            Some("HTTP") => Some(TcpProtocol::Http),
            _ => match protocol {
                Some("MYSQL") => Some(TcpProtocol::Mysql),
                _ => None,
            },
        },
        ProtocolFieldPolicy::Lenient => {
            let (field, parsed) = match proto.and_then(TcpProtocol::from_wire) {
                Some(parsed) => (PROTO_FIELD, parsed),
                None => (PROTOCOL_FIELD, protocol.and_then(TcpProtocol::from_wire)?),
            };

            if field != parsed.canonical_field() {
                warn!("TCP breakdown {parsed:?} read from deprecated field '{field}', agents should send '{}'", parsed.canonical_field());
            }

            Some(parsed)
        }
    }
}
