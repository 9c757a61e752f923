use clap::{Parser, Subcommand};
use tokio::io::BufReader;

mod app;
mod config;
mod console;
mod error;
mod state;
mod users;

use crate::{config::AppConfig, console::Console, state::AppState};

/// Manage user records over HTTP or from an interactive console.
#[derive(Debug, Parser)]
#[command(name = "usermanager", version)]
struct Cli {
    /// Keep users in process memory instead of PostgreSQL.
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Serve the REST API (default).
    Serve,
    /// Run the interactive menu on stdin/stdout.
    Console,
}

fn init_tracing(command: Command) {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "usermanager=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    // The console owns stdout, so logs go to stderr there.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match (json_logs, command) {
        (true, _) => builder.with_target(false).json().init(),
        (false, Command::Console) => builder.with_ansi(false).init(),
        (false, Command::Serve) => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);
    init_tracing(command);

    let config = AppConfig::from_env(cli.in_memory)?;
    let state = AppState::init(config).await?;

    match command {
        Command::Serve => app::serve(state).await?,
        Command::Console => {
            tracing::info!("application started");
            let mut console = Console::new(
                state.users.clone(),
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            );
            let result = console.run().await;
            state.close().await;
            result?;
        }
    }

    Ok(())
}
