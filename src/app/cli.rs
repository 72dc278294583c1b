//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mobility Features - Turn GPS pings into zone x time-bin features
#[derive(Parser, Debug)]
#[command(name = "mobility-features")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove outlier pings and sparse devices
    Denoise {
        /// Input column table (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output column table
        #[arg(short, long)]
        output: PathBuf,

        /// Drop the dist_m / dt / speed_m_s columns from the output
        #[arg(long)]
        no_deltas: bool,
    },

    /// Attach zone ids (metric grid) and time bins
    Label {
        /// Input column table (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output column table
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Aggregate labeled pings into a feature table
    Aggregate {
        /// Labeled column table (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output feature table (JSON)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run denoise, label and aggregate in one pass
    Run {
        /// Input column table (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output feature table (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the denoised table here
        #[arg(long)]
        denoised: Option<PathBuf>,

        /// Also write the labeled table here
        #[arg(long)]
        labeled: Option<PathBuf>,
    },

    /// Split a table into device-disjoint parts
    Split {
        /// Input column table (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Number of parts
        #[arg(short = 'n', long, default_value = "32")]
        parts: usize,

        /// Output directory (defaults to the data directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge part tables back into one
    Merge {
        /// Part tables (JSON)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output column table
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print dataset statistics, optionally compared with a cleaned table
    Stats {
        /// Column table (JSON)
        input: PathBuf,

        /// Cleaned table to compare against
        #[arg(long)]
        compare: Option<PathBuf>,
    },

    /// View or reset configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "denoise.window_size")
        key: String,
    },

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default directory for generated data
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".mobility_features").join("data"))
            .unwrap_or_else(|| PathBuf::from("data"))
    }
}
