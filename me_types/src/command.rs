use serde::Deserialize;
use serde::Serialize;

use crate::errors::Result;

/// Control command sent to the controller as `{"command": ..., "body": {...}}`.
///
/// Body field names are kept exactly as the controller expects them, which is
/// why `add-agent` uses `agent-id` while `heartbeat` uses `agent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "body", rename_all = "kebab-case")]
pub enum Command {
    AddAgent(AddAgent),
    Heartbeat(Heartbeat),
    Pause(EmptyBody),
    Resume(EmptyBody),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddAgent {
    #[serde(rename = "agent-id")]
    pub agent_id: String,
    pub ip: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub agent_id: String,
}

/// Serializes as `{}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmptyBody {}

impl Command {
    pub fn add_agent(agent_id: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        Command::AddAgent(AddAgent { agent_id: agent_id.into(), ip: ip.into(), port })
    }

    pub fn heartbeat(agent_id: impl Into<String>) -> Self {
        Command::Heartbeat(Heartbeat { agent_id: agent_id.into() })
    }

    pub fn pause() -> Self {
        Command::Pause(EmptyBody::default())
    }

    pub fn resume() -> Self {
        Command::Resume(EmptyBody::default())
    }

    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddAgent(_) => "add-agent",
            Command::Heartbeat(_) => "heartbeat",
            Command::Pause(_) => "pause",
            Command::Resume(_) => "resume",
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
