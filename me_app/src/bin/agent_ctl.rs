use std::time::Duration;

use clap::Parser;
use me_app::cli::CtlArgs;
use me_app::control;
use me_app::tracing_setup;
use me_types::Command;

fn main() -> anyhow::Result<()> {
    tracing_setup::init_console(tracing::Level::WARN);

    let args = CtlArgs::parse();
    let command = Command::from(args.command);

    println!("{}", command.to_json()?);

    let reply = control::send_command(&args.endpoint, &command, args.timeout_ms.map(Duration::from_millis))?;
    println!("{reply}");

    Ok(())
}
