use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use me_types::Command;

use crate::zmq_config;

/// Receives analysis records from agents and stores them in the indexing backend
#[derive(Debug, Default, Parser)]
#[command(name = "mining_engine", version)]
pub struct EngineArgs {
    /// Indexing backend host. Records are printed locally when no host is configured.
    #[arg(short = 'i', long = "ip")]
    pub ip: Option<String>,

    /// Indexing backend port
    #[arg(long)]
    pub es_port: Option<u16>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Endpoint agents push records to
    #[arg(long)]
    pub inbound: Option<String>,

    /// Endpoint of the queue between collector and sink workers
    #[arg(long)]
    pub sink: Option<String>,

    /// Number of sink workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Directory for the rolling log file
    #[arg(long)]
    pub log_dir: Option<String>,
}

/// Sends one control command to the controller and prints its reply
#[derive(Debug, Parser)]
#[command(name = "agent_ctl", version)]
pub struct CtlArgs {
    /// Controller command endpoint
    #[arg(short, long, default_value = zmq_config::CONTROLLER_ADDR)]
    pub endpoint: String,

    /// Give up waiting for the reply after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: CtlCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CtlCommand {
    /// Register an agent with the controller
    AddAgent {
        #[arg(long)]
        agent_id: String,
        #[arg(long)]
        ip: String,
        #[arg(long)]
        port: u16,
    },
    /// Report an agent as alive
    Heartbeat {
        #[arg(long)]
        agent_id: String,
    },
    /// Pause capture
    Pause,
    /// Resume capture
    Resume,
}

impl From<CtlCommand> for Command {
    fn from(command: CtlCommand) -> Self {
        match command {
            CtlCommand::AddAgent { agent_id, ip, port } => Command::add_agent(agent_id, ip, port),
            CtlCommand::Heartbeat { agent_id } => Command::heartbeat(agent_id),
            CtlCommand::Pause => Command::pause(),
            CtlCommand::Resume => Command::resume(),
        }
    }
}
