//! CLI definitions for fanout.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// fanout CLI.
#[derive(Parser)]
#[command(name = "fanout")]
#[command(about = "Send one prompt to several chat assistants in your own browser")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the coordinator and the HTTP/WebSocket server (default)
    Run {
        /// Server host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Send a prompt to one or more platforms and print the answers
    Query {
        /// The prompt to send
        prompt: String,

        /// Platform to query; repeat for several. Defaults to the enabled set.
        #[arg(short, long = "platform")]
        platforms: Vec<String>,

        /// Print answers as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether platform tabs are open
    Check {
        /// Platform to check. Defaults to every registered platform.
        platform: Option<String>,
    },

    /// List browser tabs
    Tabs,

    /// List registered platforms
    Platforms,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Load and validate the configuration file
    Validate,

    /// Print the effective configuration as TOML
    Show,
}
