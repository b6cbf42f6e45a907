// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Herald - welcome-message web service.
//!
//! This is the binary entry point for the Herald server and its maintenance
//! commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod seed;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Herald - welcome-message web service.
#[derive(Parser, Debug)]
#[command(name = "herald", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve,
    /// Clear the message table and insert the default welcome message.
    Seed,
    /// Print every stored message.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match herald_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            herald_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Seed) => seed::run_seed(config).await,
        Some(Commands::Check) => check::run_check(config).await,
        None => {
            println!("herald: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["herald", "seed", "--config", "/tmp/h.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Seed)));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/h.toml")));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = herald_config::load_and_validate_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.rate_limit.max_requests, 10);
    }
}
