use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "zenpump", version, about = "Zenpump staged countdown sequencer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured routine live in the terminal
    Run {
        /// Poll interval in milliseconds (defaults to runner.poll_interval_ms)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Show the task sequence the current routine expands to
    Plan {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Production log
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
}

fn main() {
    // stdout carries status lines and JSON; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("zenpump_cli=info,zenpump_core=info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { interval_ms } => commands::run::run(interval_ms),
        Commands::Plan { json } => commands::plan::run(json),
        Commands::Config { action } => commands::config::run(action),
        Commands::Log { action } => commands::log::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
