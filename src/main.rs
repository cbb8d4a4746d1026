// ABOUTME: Entry point for the scon CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, ConfigCommand};
use scon::config::Config;
use scon::engine::Engine;
use scon::error::Result;
use scon::output::{Output, OutputMode};
use scon::paths::StatePaths;
use scon::runtime::CliDriver;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --verbose wins over RUST_LOG; otherwise RUST_LOG, then warn.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.format.json {
        OutputMode::Json
    } else if cli.format.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    if let Err(e) = run(cli.command, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, output: &mut Output) -> Result<()> {
    let paths = StatePaths::resolve()?;

    match command {
        Commands::Create { name, image } => {
            commands::create(&engine(&paths)?, &name, &image, output).await
        }
        Commands::Start { name } => commands::start(&engine(&paths)?, &name, output).await,
        Commands::Stop { name, force } => {
            commands::stop(&engine(&paths)?, &name, force, output).await
        }
        Commands::Delete {
            name,
            option,
            force,
        } => commands::delete(&engine(&paths)?, &name, option.as_deref(), force, output).await,
        Commands::Snapshot { name, tag } => {
            commands::snapshot(&engine(&paths)?, &name, tag, output).await
        }
        Commands::Tag { name, snapshot } => {
            commands::tag(&engine(&paths)?, &name, &snapshot, true, output).await
        }
        Commands::Untag { name, snapshot } => {
            commands::tag(&engine(&paths)?, &name, &snapshot, false, output).await
        }
        Commands::Prune { name } => {
            commands::prune(&engine(&paths)?, name.as_deref(), output).await
        }
        Commands::List => commands::list(&engine(&paths)?, output),
        Commands::Config(ConfigCommand::Set { key, value }) => {
            commands::config::set(&paths, &key, &value, output)
        }
        Commands::Config(ConfigCommand::Show) => commands::config::show(&paths, output),
    }
}

/// Engine over the configured runtime binary.
fn engine(paths: &StatePaths) -> Result<Engine<CliDriver>> {
    let config = Config::load(&paths.config())?;
    Ok(Engine::from_config(paths, &config))
}
