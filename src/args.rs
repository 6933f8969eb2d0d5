use crate::util::preset_parser;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rowing ergometer stroke detection and calibration replay.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a recorded delta-time log and print the calibration totals.
    Replay {
        /// Newline-separated impulse delta-times in microseconds.
        file: String,
        #[command(flatten)]
        profile: ProfileArgs,
        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Print the resolved profile.
    Show {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// List built-in presets.
    Presets,
    /// Print the per-user profile location.
    Path,
}

#[derive(Args, Clone, Default)]
pub struct ProfileArgs {
    /// KDL profile file.
    #[arg(long)]
    pub profile: Option<String>,
    #[arg(long, value_parser = preset_parser, conflicts_with = "profile")]
    pub preset: Option<String>,
}
