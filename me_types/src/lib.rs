//! # me_types
//!
//! Analysis records flowing through the mining engine and the control
//! command envelopes understood by the controller.

pub mod command;
pub mod errors;
pub mod record;

pub use command::AddAgent;
pub use command::Command;
pub use command::EmptyBody;
pub use command::Heartbeat;
pub use errors::RecordError;
pub use errors::Result;
pub use record::Collection;
pub use record::ProtocolFieldPolicy;
pub use record::Record;
pub use record::RecordKind;
pub use record::TcpProtocol;
pub use record::classify;
