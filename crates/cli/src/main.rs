use std::{path::Path, process};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod poll;
mod validate;

#[derive(Parser, Debug)]
#[clap(author, version, about = "PaymentSheet - intent status and deferred intent tooling", long_about = None)]
struct Opts {
    /// Directory to load a .env file from (default: current directory)
    #[arg(long = "env-dir", global = true, default_value = ".")]
    env_dir: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Poll an intent and print each status change
    Poll(poll::PollCommand),
    /// Check a server-returned intent against an intent configuration
    Validate(validate::ValidateCommand),
}

#[tokio::main]
async fn main() {
    let opts: Opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            process::exit(e.exit_code());
        }
    };

    load_env_file(Path::new(&opts.env_dir));

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = handle_command(opts.command).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Load environment variables from a .env file in the given directory
fn load_env_file(dir: &Path) {
    let env_file_path = dir.join(".env");

    match dotenvy::from_path(&env_file_path) {
        Ok(_) => {
            eprintln!("✓ Loaded environment from {}", env_file_path.display());
        }
        Err(e) if e.not_found() => {
            // .env file not found is fine, just continue silently
        }
        Err(e) => {
            eprintln!(
                "Warning: Failed to load .env file at {}: {}",
                env_file_path.display(),
                e
            );
        }
    }
}

async fn handle_command(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Poll(cmd) => cmd.execute().await,
        Command::Validate(cmd) => cmd.execute(),
    }
}
