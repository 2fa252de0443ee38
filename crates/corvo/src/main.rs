// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Corvo - a conversational assistant front end for messaging platforms.
//!
//! This is the binary entry point for the Corvo daemon and its operator
//! commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod status;

use clap::{Parser, Subcommand};

/// Corvo - a conversational assistant front end for messaging platforms.
#[derive(Parser, Debug)]
#[command(name = "corvo", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Corvo daemon.
    Serve,
    /// Enqueue a broadcast job for all active subscribers now.
    Broadcast {
        /// Message text to broadcast.
        message: String,
    },
    /// Show queue, job, and trigger counts from the store.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match corvo_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            corvo_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Broadcast { message }) => run_broadcast(&config, &message).await,
        Some(Commands::Status { json }) => status::run_status(&config, json).await,
        None => {
            println!("corvo: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Operator action: create a pending broadcast job ("send broadcast now").
async fn run_broadcast(
    config: &corvo_config::CorvoConfig,
    message: &str,
) -> Result<(), corvo_core::CorvoError> {
    if message.trim().is_empty() {
        return Err(corvo_core::CorvoError::Data(
            "broadcast message cannot be empty".into(),
        ));
    }

    let db = corvo_storage::Database::open_with_options(
        &config.storage.database_path,
        config.storage.wal_mode,
    )
    .await?;
    let id = corvo_storage::queries::broadcasts::create(&db, message).await?;
    db.close().await?;

    println!("broadcast job {id} created (picked up by the next worker poll)");
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed).
        let config = corvo_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.agent.name, "corvo");
    }
}
