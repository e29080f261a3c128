//! Command-line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ParkPulse - how busy is the park right now?
///
/// Examples:
///   parkpulse report basketball busy
///   parkpulse status
///   parkpulse status pickleball --json
///   parkpulse parking adjust lot1 -- -3
///   parkpulse check-in 33.9786 -84.1317
///   parkpulse hazard report maintenance "Net is torn" --area volleyball
///   parkpulse hazard alert basketball slippery
///   parkpulse init-config
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for parkpulse.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "PARKPULSE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Seconds to wait for remote replication before exiting
    #[arg(long, default_value = "5", value_name = "SECS", global = true)]
    pub grace_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Submit an activity report for an area
    Report {
        /// pickleball, basketball, futsal, volleyball or parking
        area: String,
        /// Light, Medium or Busy
        level: String,
    },

    /// Show current status of one area, or every area
    Status {
        area: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Parking lot occupancy
    #[command(subcommand)]
    Parking(ParkingCommand),

    /// Hazard, suspicious-activity and maintenance reports; area alerts
    #[command(subcommand)]
    Hazard(HazardCommand),

    /// Record an arrival at a location; counts a car if inside the park
    CheckIn {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },

    /// Print a default configuration file
    InitConfig,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ParkingCommand {
    /// Show occupancy of every lot
    Show {
        #[arg(long)]
        json: bool,
    },

    /// Change a lot's occupancy by DELTA cars
    Adjust {
        lot: String,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum HazardCommand {
    /// Submit a report for review
    Report {
        /// suspicious, hazard, maintenance, other or alert
        kind: String,
        description: String,
        /// Where in the park (defaults to "Not specified")
        #[arg(long)]
        location: Option<String>,
        /// Area the report is about (required for alert)
        #[arg(long)]
        area: Option<String>,
    },

    /// Raise an alert for an area: a preset id (slippery, cold-sand, no-lights) or free text
    Alert { area: String, alert: String },

    /// Alerts raised for an area in the last day
    Alerts {
        area: String,
        #[arg(long)]
        json: bool,
    },

    /// Every report recorded on this device
    List {
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    /// Default filter directive from -v / -q. `RUST_LOG` overrides it.
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "parkpulse_core=debug,parkpulse=debug,info"
        } else {
            "warn"
        }
    }
}
