mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use stratus_core::CloudApp;

use crate::cli::Cli;
use crate::commands::{LocalCommand, ServerCommand};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;

    match ServerCommand::from_command(command) {
        Ok(cmd) => {
            let target = config::resolve_target(&global)?;
            let app = CloudApp::new(target.client.clone())?;

            tracing::debug!(
                command = ?cmd,
                server = %target.client.server_url,
                "dispatching command"
            );
            commands::dispatch(cmd, &app, &target, &global).await
        }

        // Config commands don't need a server connection
        Err(LocalCommand::Config(args)) => commands::config_cmd::handle(args, &global),

        Err(LocalCommand::Completions(args)) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "stratus", &mut std::io::stdout());
            Ok(())
        }
    }
}
