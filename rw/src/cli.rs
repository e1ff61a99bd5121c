//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use eyre::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::domain::{BudgetTier, GeoLocation, RestorationType};

/// rewild - AI-assisted depaving and site restoration plans
#[derive(Parser)]
#[command(
    name = "rw",
    about = "Turn a photo of paved ground into a restoration vision and a phased plan",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the interactive wizard (default)
    Tui {
        /// Start by analysing this photo
        #[arg(short, long, conflicts_with = "demo")]
        image: Option<PathBuf>,

        /// Start with the demo photo
        #[arg(long)]
        demo: bool,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Analyse a site photo and print the assessment
    Analyze {
        /// Site photo (png, jpg, webp, heic)
        image: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Analyse a photo, then generate the vision and plan in one go
    Plan {
        /// Site photo (png, jpg, webp, heic)
        image: PathBuf,

        /// Restoration type (see `rw types`)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        restoration_type: RestorationType,

        /// Budget tier (low, medium, high)
        #[arg(short, long, default_value = "medium")]
        budget: BudgetTier,

        /// Look up local service providers for every phase
        #[arg(short, long)]
        services: bool,

        /// Save the images and plan under this directory [default: config paths.output-dir]
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// List restoration types and budget tiers
    Types,
}

/// Coordinates given on the command line
#[derive(Debug, Clone, Default, Args)]
pub struct LocationArgs {
    /// Latitude in degrees (requires --lon)
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in degrees (requires --lat)
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl LocationArgs {
    /// Validated location, if both coordinates were given
    pub fn location(&self) -> Result<Option<GeoLocation>> {
        debug!(lat = ?self.lat, lon = ?self.lon, "LocationArgs::location: called");
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => {
                let location = GeoLocation::new(lat, lon).map_err(|e| eyre::eyre!("Invalid --lat/--lon: {}", e))?;
                Ok(Some(location))
            }
            _ => Ok(None),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rewild")
        .join("logs")
        .join("rewild.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with the API key status and log path
pub fn generate_after_help(api_key_env: &str) -> String {
    debug!(%api_key_env, "generate_after_help: called");
    let key_set = std::env::var(api_key_env).is_ok_and(|v| !v.is_empty());
    let icon = if key_set { "\u{2705}" } else { "\u{274C}" };
    let status = if key_set { "set" } else { "not set" };

    let mut help = String::new();
    help.push_str("AI service:\n");
    help.push_str(&format!("  {} {:<16} {}\n", icon, api_key_env, status));
    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

/// Output format for analyze/plan
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["rw"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_tui_with_image() {
        let cli = Cli::parse_from(["rw", "tui", "--image", "lot.jpg"]);
        match cli.command {
            Some(Command::Tui { image, demo, location }) => {
                assert_eq!(image, Some(PathBuf::from("lot.jpg")));
                assert!(!demo);
                assert!(location.location().unwrap().is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_image_conflicts_with_demo() {
        let result = Cli::try_parse_from(["rw", "tui", "--image", "lot.jpg", "--demo"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_plan() {
        let cli = Cli::parse_from([
            "rw",
            "plan",
            "lot.jpg",
            "--type",
            "rain-garden",
            "--budget",
            "low",
            "--services",
            "--lat",
            "-33.87",
            "--lon",
            "151.21",
        ]);
        match cli.command {
            Some(Command::Plan {
                restoration_type,
                budget,
                services,
                out,
                format,
                location,
                ..
            }) => {
                assert_eq!(restoration_type, RestorationType::RainGarden);
                assert_eq!(budget, BudgetTier::Low);
                assert!(services);
                assert!(out.is_none());
                assert_eq!(format, OutputFormat::Text);
                let loc = location.location().unwrap().unwrap();
                assert_eq!(loc.latitude, -33.87);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_plan_rejects_unknown_type() {
        let result = Cli::try_parse_from(["rw", "plan", "lot.jpg", "--type", "parking-garage"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_lat_requires_lon() {
        let result = Cli::try_parse_from(["rw", "analyze", "lot.jpg", "--lat", "52.5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_location_args_out_of_range() {
        let args = LocationArgs {
            lat: Some(95.0),
            lon: Some(10.0),
        };
        assert!(args.location().is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }
}
