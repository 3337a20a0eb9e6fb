//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use btscan_core::ScanMode;

/// btscan - discover nearby Bluetooth devices
#[derive(Parser, Debug)]
#[command(name = "btscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover nearby devices
    #[command(after_help = "Radio scanning needs a build with the `ble` feature \
        (and `classic` for BR/EDR inquiry on Linux). Use --replay FILE to run from a recording.")]
    Discover(DiscoverArgs),
}

// ==================== Discover ====================

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Discovery procedure to run
    #[arg(short, long, value_enum, default_value = "all", env = "BTSCAN_MODE")]
    pub mode: ModeArg,

    /// Scan window in seconds (default: 8 for classic, 2 for BLE)
    #[arg(short, long, env = "BTSCAN_TIMEOUT")]
    pub timeout: Option<f64>,

    /// Skip remote name resolution
    #[arg(long)]
    pub no_names: bool,

    /// Only show devices whose name matches this regex
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: FormatArg,

    /// Replay one recorded scan from a JSON file instead of using the radio
    #[arg(long)]
    pub replay: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Classic (BR/EDR) inquiry
    Classic,
    /// Bluetooth Low Energy scan
    Le,
    /// Classic inquiry, then BLE scan
    All,
}

impl ModeArg {
    /// Scan modes to run, in order.
    pub fn scan_modes(&self) -> Vec<ScanMode> {
        match self {
            ModeArg::Classic => vec![ScanMode::Classic],
            ModeArg::Le => vec![ScanMode::LowEnergy],
            ModeArg::All => vec![ScanMode::Classic, ScanMode::LowEnergy],
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    /// `address - name` lines and a count
    Plain,
    /// Table with signal strength
    Table,
    /// JSON document
    Json,
}
