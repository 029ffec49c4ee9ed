//! Camera adapter: captures a photo by running an external command.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use photo_narrator_core::{AcquireOptions, Acquisition, ImageRef, MediaTypes};
use tracing::{debug, info, warn};

/// Placeholder replaced with the output path in command arguments.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Camera that shells out to a capture tool such as `fswebcam` or `imagesnap`.
///
/// The tool must write a JPEG to the path substituted for `{output}`. If it
/// exits successfully without writing anything the capture counts as
/// cancelled.
///
/// Only the most recent capture is kept on disk; taking a new photo removes
/// the previous one.
#[derive(Debug)]
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
    capture_dir: PathBuf,
    last_capture: Mutex<Option<PathBuf>>,
}

impl CommandCamera {
    /// Parses a whitespace-separated command line.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is empty or lacks `{output}`.
    pub fn parse(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts.next().context("Camera command is empty")?;
        let args: Vec<String> = parts.collect();

        if !args.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER)) {
            anyhow::bail!("Camera command must contain {OUTPUT_PLACEHOLDER}: {command}");
        }

        Ok(Self {
            program,
            args,
            capture_dir: std::env::temp_dir().join("photo-narrator"),
            last_capture: Mutex::new(None),
        })
    }

    /// Sets the directory captured photos are written to.
    #[must_use]
    pub fn with_capture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capture_dir = dir.into();
        self
    }

    /// Runs the capture command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started or exits with failure.
    pub fn capture(&self, options: &AcquireOptions) -> Result<Acquisition> {
        if options.media_types == MediaTypes::Videos {
            anyhow::bail!("Camera capture only produces still images");
        }

        std::fs::create_dir_all(&self.capture_dir).with_context(|| {
            format!(
                "Failed to create capture directory: {}",
                self.capture_dir.display()
            )
        })?;
        // Removed on drop unless the command produces a photo.
        let output = tempfile::Builder::new()
            .prefix("capture-")
            .suffix(".jpg")
            .tempfile_in(&self.capture_dir)
            .context("Failed to create capture file")?
            .into_temp_path();

        let output_str = output.to_string_lossy();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(OUTPUT_PLACEHOLDER, &output_str))
            .collect();

        info!("Capturing photo with {}", self.program);
        debug!("Camera command: {} {}", self.program, args.join(" "));
        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::null())
            .status()
            .with_context(|| format!("Failed to run camera command: {}", self.program))?;

        if !status.success() {
            anyhow::bail!("Camera command exited with {status}");
        }

        let captured = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
        if captured == 0 {
            debug!("Camera produced no image; treating as cancelled");
            return Ok(Acquisition::Cancelled);
        }

        let output = output.keep().context("Failed to keep capture file")?;
        self.replace_last_capture(output.clone());
        Ok(Acquisition::Selected(ImageRef::from_path(output)))
    }

    fn replace_last_capture(&self, capture: PathBuf) {
        let previous = self
            .last_capture
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(capture);
        if let Some(previous) = previous {
            debug!("Removing previous capture {}", previous.display());
            if let Err(e) = std::fs::remove_file(&previous) {
                warn!("Failed to remove {}: {e}", previous.display());
            }
        }
    }
}
