//! `kvm-wg` binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use kvm_cli::cli::{Cli, Commands, ConfigCommands};
use kvm_cli::commands::{
    config, Action, ConfigCommand, KeygenCommand, LifecycleCommand, PeersCommand, StatusCommand,
};
use kvm_cli::output::OutputFormat;
use kvm_cli::CliError;
use kvm_wireguard::{SystemRunner, WireGuardService, WireGuardSettings};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_settings(cli: &Cli) -> Result<WireGuardSettings, CliError> {
    match &cli.settings {
        Some(path) => {
            debug!(path = %path.display(), "loading settings");
            Ok(WireGuardSettings::from_file(path)?)
        }
        None => Ok(WireGuardSettings::default()),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    if let Commands::Config { command: ConfigCommands::Check { file } } = &cli.command {
        return config::check(&mut stdout, &format, &config::read_source(file)?);
    }

    let settings = load_settings(&cli)?;
    let runner = SystemRunner::new(&settings);
    let service = WireGuardService::new(settings, runner)?;
    let interface = cli.command.interface(&cli.interface);

    match &cli.command {
        Commands::Status => {
            let cmd = StatusCommand::new(&service);
            cmd.execute(&mut stdout, &format, interface).await?;
        }
        Commands::Start => {
            let cmd = LifecycleCommand::new(&service);
            cmd.execute(&mut stdout, &format, Action::Start, interface).await?;
        }
        Commands::Stop => {
            let cmd = LifecycleCommand::new(&service);
            cmd.execute(&mut stdout, &format, Action::Stop, interface).await?;
        }
        Commands::Restart => {
            let cmd = LifecycleCommand::new(&service);
            cmd.execute(&mut stdout, &format, Action::Restart, interface).await?;
        }
        Commands::Up { .. } => {
            let cmd = LifecycleCommand::new(&service);
            cmd.execute(&mut stdout, &format, Action::Up, interface).await?;
        }
        Commands::Down { .. } => {
            let cmd = LifecycleCommand::new(&service);
            cmd.execute(&mut stdout, &format, Action::Down, interface).await?;
        }
        Commands::Config { command } => {
            let cmd = ConfigCommand::new(&service);
            cmd.execute(&mut stdout, &format, interface, command).await?;
        }
        Commands::Keygen => {
            let cmd = KeygenCommand::new(&service);
            cmd.execute(&mut stdout, &format).await?;
        }
        Commands::Peers => {
            let cmd = PeersCommand::new(&service);
            cmd.execute(&mut stdout, &format, interface).await?;
        }
        Commands::Sync => {
            let cmd = ConfigCommand::new(&service);
            cmd.sync(&mut stdout, &format, interface).await?;
        }
    }

    Ok(())
}
