//! CLI command definitions and handlers.

pub mod classify;
pub mod interactive;
pub mod models;
mod session;

use clap::{Parser, Subcommand};

/// Photo Narrator - Classify photos and speak what they show
#[derive(Parser)]
#[command(name = "photo-narrator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared classify arguments (paths, output, speech).
    #[command(flatten)]
    pub classify: classify::ClassifyArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Classify image files and announce the predictions
    Classify(classify::ClassifyArgs),
    /// Choose or capture images from a keyboard menu
    Interactive(interactive::InteractiveArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Everything classified.
    Success = 0,
    /// At least one image could not be classified.
    Failures = 1,
    /// The command itself failed.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
