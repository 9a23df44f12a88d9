use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{observation, parse_location, serve};
use surfe_diem::config::{Config, LoggingConfig};

#[derive(Parser)]
#[command(
    name = "surfe-diem",
    version,
    about = "Surf conditions API: buoys, spots, tides and batch forecasts",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides `logging.format` from the config
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// TOML configuration file; environment variables override it
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the latest NDBC observation for a buoy
    Observation {
        /// NDBC station id, e.g. 46026
        buoy_id: String,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Parse an NDBC location string into [lon, lat]
    ParseLocation {
        /// Location text, e.g. "37.754 N 122.839 W (37°45'14\" N 122°50'20\" W)"
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded before tracing so the [logging] section applies
    let config_path = match &cli.command {
        Commands::Serve { config } | Commands::Observation { config, .. } => config.clone(),
        Commands::ParseLocation { .. } => None,
    };
    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    setup_tracing(&config.logging, cli.log_format.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Serve { config: path } => {
            tracing::info!(config = ?path, "Starting serve command");
            serve(config).await?;
        }

        Commands::Observation { buoy_id, .. } => {
            tracing::info!(buoy_id = %buoy_id, "Starting observation command");
            observation(buoy_id, config).await?;
        }

        Commands::ParseLocation { text } => {
            parse_location(&text)?;
        }
    }

    Ok(())
}

/// The `--log-format` flag wins over the configured format
fn resolve_log_format<'a>(logging: &'a LoggingConfig, flag: Option<&'a str>) -> &'a str {
    flag.unwrap_or(logging.format.as_str())
}

fn setup_tracing(logging: &LoggingConfig, format_flag: Option<&str>, verbose: bool) -> Result<()> {
    let directive = logging.filter_directive(verbose);
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new(directive)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive))
    };

    match resolve_log_format(logging, format_flag) {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_flag_overrides_config() {
        let mut logging = LoggingConfig::default();
        logging.format = "json".to_string();

        assert_eq!(resolve_log_format(&logging, None), "json");
        assert_eq!(resolve_log_format(&logging, Some("text")), "text");
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["surfe-diem", "serve", "--log-format", "json", "-v"]);
        assert_eq!(cli.log_format.as_deref(), Some("json"));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Serve { config: None }));
    }
}
