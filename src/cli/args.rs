//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::{Lens, Orientation, Quality};

/// Stream a camera through a detector and report what it finds
#[derive(Parser, Debug)]
#[command(name = "vision-cam")]
#[command(version, about = "Camera session with pluggable frame detection", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Camera lens to use (overrides config)
    #[arg(long, global = true)]
    pub lens: Option<Lens>,

    /// Capture resolution preset (overrides config)
    #[arg(long, short, global = true)]
    pub resolution: Option<Quality>,

    /// Device orientation used for frame rotation (overrides config)
    #[arg(long, global = true)]
    pub orientation: Option<Orientation>,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available cameras
    ListCameras,
    /// Stream frames through the bright-region detector
    Run {
        /// Seconds to stream before stopping (Ctrl+C stops early)
        #[arg(long, short, default_value = "5")]
        duration: u64,

        /// Luminance threshold (0-255) for a pixel to count as bright
        #[arg(long, default_value = "200")]
        threshold: u8,
    },
    /// Take a still picture and write its raw RGB bytes to a file
    Snapshot {
        /// Output file
        output: PathBuf,
    },
    /// Record a raw RGB clip
    Record {
        /// Output file
        output: PathBuf,

        /// Clip length in seconds
        #[arg(long, short, default_value = "3")]
        seconds: u64,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
