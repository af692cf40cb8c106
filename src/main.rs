mod args;
mod commands;

use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            skip_update,
        } => commands::run::cmd_run(config, skip_update).await?,
        Commands::Update => commands::update::cmd_update().await?,
        Commands::Status => commands::status::cmd_status()?,
        Commands::Configs { command } => commands::configs::cmd_configs(command)?,
        Commands::Logs { command } => commands::logs::cmd_logs(command)?,
        Commands::Completions { shell } => commands::completions::cmd_completions(shell)?,
    }

    Ok(())
}
