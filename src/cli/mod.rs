//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vulnlens",
    version,
    author = "neur0map",
    about = "CVE exploitation status lookup service",
    long_about = "vulnlens serves vulnerability records from a local CVE dataset over HTTP, \
                  maps Red Hat Security Advisories to their CVEs, and enriches CSV reports \
                  with reported-exploited and exploit-maturity columns."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/vulnlens/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Look up CVE or RHSA identifiers and print the records as JSON
    Lookup {
        /// Comma-separated identifiers, e.g. "CVE-2023-0001,RHSA-2023:1234"
        ids: String,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Enrich a CSV report with exploitation status columns
    Enrich {
        /// CSV file to enrich
        input: PathBuf,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["vulnlens", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Serve { bind, port } => {
                assert_eq!(bind, None);
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
