//! Classify command - classify image files and announce the predictions.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use photo_narrator_adapters::gallery::{Gallery, QueuedGallery};
use photo_narrator_core::ImageSourceKind;
use tracing::info;

use super::session::{Session, SessionArgs};
use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, PredictionRecord, Spinner};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per image
    #[default]
    Text,
    /// JSON Lines (one JSON object per line)
    Jsonl,
    /// Single JSON array
    Json,
}

/// Arguments for classifying image files.
#[derive(Args, Clone)]
pub struct ClassifyArgs {
    /// Image files to classify, in order
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Controller and speech options.
    #[command(flatten)]
    pub session: SessionArgs,
}

impl ClassifyArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        if self.format.is_none() {
            self.format = config
                .output
                .format
                .as_deref()
                .and_then(|s| OutputFormat::from_str(s, true).ok());
        }
        if !self.pretty {
            self.pretty = config.output.pretty.unwrap_or(false);
        }
        self.session = self.session.with_config(config);
        self
    }

    /// Get output format with fallback to text.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }
}

/// Run the classify command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings. Returns [`ExitCode::Failures`] if
/// any image could not be classified.
pub fn run(args: &ClassifyArgs) -> Result<ExitCode> {
    info!("Running classify command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    let gallery = Gallery::Queued(QueuedGallery::new(args.paths.clone()));
    let mut session = Session::build(&args.session, gallery, Vec::new())?;

    let spinner = Spinner::start("Loading...", std::io::stderr().is_terminal());
    session.controller.startup()?;
    spinner.finish();

    let output = JsonOutput::stdout();
    let format = args.format();
    let mut records = Vec::new();
    let mut classified = 0;
    let mut failed = 0;

    for path in &args.paths {
        let state = session
            .controller
            .request_and_classify(ImageSourceKind::Gallery)?;
        let record = PredictionRecord::from_state(&path.display().to_string(), state);

        if record.is_failure() {
            failed += 1;
        } else if record.predictions.is_some() {
            classified += 1;
        }

        match format {
            OutputFormat::Text => output.write_text(&record)?,
            OutputFormat::Jsonl => output.write_line(&record)?,
            OutputFormat::Json => records.push(record),
        }
    }

    if format == OutputFormat::Json {
        output.write_array(&records, args.pretty)?;
    }

    session.finish();
    info!("Classified {classified} images, {failed} failed");

    Ok(if failed > 0 {
        ExitCode::Failures
    } else {
        ExitCode::Success
    })
}
