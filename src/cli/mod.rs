//! CLI module for Itinera
//!
//! Command-line parsing for the itinera-server binary, built on clap.

use crate::utils::toml_config::{ConfigError, ItineraConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Itinera - agentic trip itinerary server
///
/// Serves an HTTP API that turns trip requests into day-by-day itineraries
/// using a team of model-backed agents.
#[derive(Parser, Debug)]
#[command(
    name = "itinera-server",
    version,
    about = "Itinera - agentic trip itinerary server",
    long_about = "Serves an HTTP API that turns trip requests into day-by-day itineraries\n\
                  using a team of model-backed agents (flights, hotels, transport, events,\n\
                  weather and a planner).\n\n\
                  Run without arguments to start the server.",
    after_help = "EXAMPLES:\n    \
                  itinera-server                              # Start the server (reads itinera.toml)\n    \
                  itinera-server --config my.toml             # Use a custom config file\n    \
                  itinera-server config --validate            # Check the config file and exit"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "itinera.toml", global = true)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show configuration information
    Config {
        /// Print the full effective configuration as TOML
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Run the `config` subcommand and return the text to print.
pub fn describe_config(
    path: &std::path::Path,
    full: bool,
    validate: bool,
) -> Result<String, ConfigError> {
    let config = ItineraConfig::load(path)?;
    let mut out = Vec::new();

    if validate {
        config.validate()?;
        out.push(format!("{} is valid", path.display()));
    }

    if full {
        out.push(toml::to_string_pretty(&config).map_err(|e| ConfigError::ValidationError(e.to_string()))?);
    } else {
        out.push(format!(
            "server: {}:{} (log level {})",
            config.server.host, config.server.port, config.server.log_level
        ));
        out.push(format!(
            "provider: {} (default model {})",
            config.provider.kind(),
            config.provider.default_model()
        ));
    }

    Ok(out.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_validate_subcommand() {
        let cli = Cli::try_parse_from(["itinera-server", "config", "--validate", "-c", "x.toml"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                validate: true,
                full: false
            })
        ));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["itinera-server"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("itinera.toml"));
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }
}
