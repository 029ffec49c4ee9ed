//! Shared wiring of the controller and its adapters.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use photo_narrator_adapters::camera::CommandCamera;
use photo_narrator_adapters::gallery::Gallery;
use photo_narrator_adapters::models::{self, CLASSIFIER_MODEL, LABELS_MODEL};
use photo_narrator_adapters::speech::{default_speech_command, program_on_path};
use photo_narrator_adapters::{CommandAnnouncer, FsImageDecoder, SystemAcquirer, TranscriptAnnouncer};
use photo_narrator_core::controller::DEFAULT_INTRO;
use photo_narrator_core::inference::{DevicePreference, MobileNetLoader, DEFAULT_TOP_K};
use photo_narrator_core::{Announcement, Announcer, Controller, EventSink};
use tracing::{debug, warn};

use crate::config::AppConfig;

/// Parse and validate a top-k value (at least 1).
fn parse_top_k(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid count"))?;
    if value == 0 {
        Err("top-k must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Arguments shared by every command that runs the controller.
#[derive(Args, Clone, Default)]
pub struct SessionArgs {
    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Number of predictions per image
    #[arg(long, value_name = "N", value_parser = parse_top_k)]
    pub top_k: Option<usize>,

    /// Do not speak; write the spoken phrases to stderr instead
    #[arg(long)]
    pub mute: bool,

    /// Text-to-speech command (phrase is appended as the last argument)
    #[arg(long, value_name = "CMD")]
    pub speech_command: Option<String>,

    /// Camera capture command containing {output}
    #[arg(long, value_name = "CMD")]
    pub camera_command: Option<String>,

    /// Phrase spoken before the labels
    #[arg(long, value_name = "TEXT")]
    pub intro: Option<String>,

    /// Run inference on the CPU even when a GPU is available
    #[arg(long)]
    pub cpu: bool,
}

impl SessionArgs {
    /// Apply configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        if !self.mute {
            self.mute = !config.speech.enabled.unwrap_or(true);
        }
        self.top_k = self.top_k.or(config.general.top_k);
        if self.speech_command.is_none() {
            self.speech_command.clone_from(&config.speech.command);
        }
        if self.camera_command.is_none() {
            self.camera_command.clone_from(&config.camera.command);
        }
        if self.intro.is_none() {
            self.intro.clone_from(&config.speech.intro);
        }
        if self.models_dir.is_none() {
            self.models_dir.clone_from(&config.models.dir);
        }
        if !self.cpu {
            self.cpu = config.general.device.as_deref() == Some("cpu");
        }
        self
    }

    /// Models directory with fallback to the default location.
    #[must_use]
    pub fn models_dir(&self) -> PathBuf {
        self.models_dir.clone().unwrap_or_else(models::models_dir)
    }

    fn top_k(&self) -> usize {
        self.top_k.unwrap_or(DEFAULT_TOP_K)
    }

    fn intro(&self) -> &str {
        self.intro.as_deref().unwrap_or(DEFAULT_INTRO)
    }

    const fn device(&self) -> DevicePreference {
        if self.cpu {
            DevicePreference::Cpu
        } else {
            DevicePreference::Auto
        }
    }
}

/// A wired controller plus the resources that outlive single requests.
pub struct Session {
    /// The application controller.
    pub controller: Controller,
    speech: Option<Arc<CommandAnnouncer>>,
}

impl Session {
    /// Builds the controller over the filesystem decoder, MobileNet loader,
    /// `gallery`, the optional camera and the configured announcer.
    ///
    /// `sinks` are registered after the announcement observer.
    pub fn build(
        args: &SessionArgs,
        gallery: Gallery,
        sinks: Vec<Box<dyn EventSink>>,
    ) -> Result<Self> {
        let dir = args.models_dir();
        debug!("Using models directory: {}", dir.display());
        let weights = models::model_path(&dir, CLASSIFIER_MODEL)
            .context("Classifier missing from model registry")?;
        let labels =
            models::model_path(&dir, LABELS_MODEL).context("Labels missing from model registry")?;
        let loader = MobileNetLoader::new(weights, labels)
            .with_top_k(args.top_k())
            .with_device(args.device());

        let camera = args
            .camera_command
            .as_deref()
            .map(CommandCamera::parse)
            .transpose()?;
        let acquirer = SystemAcquirer::new(gallery).with_camera(camera);

        let (announcer, speech) = build_announcer(args)?;

        let mut controller = Controller::new(
            Box::new(loader),
            Box::new(acquirer),
            Arc::new(FsImageDecoder::new()),
        )
        .with_sink(Box::new(
            Announcement::new(announcer).with_intro(args.intro()),
        ));
        for sink in sinks {
            controller = controller.with_sink(sink);
        }

        Ok(Self { controller, speech })
    }

    /// Waits until every queued phrase has been spoken.
    pub fn finish(&self) {
        if let Some(speech) = &self.speech {
            speech.finish();
        }
    }
}

fn build_announcer(
    args: &SessionArgs,
) -> Result<(Arc<dyn Announcer>, Option<Arc<CommandAnnouncer>>)> {
    if args.mute {
        return Ok((Arc::new(TranscriptAnnouncer::stderr()), None));
    }

    let command = args
        .speech_command
        .as_deref()
        .unwrap_or(default_speech_command());
    let program = command.split_whitespace().next().unwrap_or_default();
    if !program_on_path(program) {
        warn!("Speech command '{program}' not found; writing phrases to stderr");
        return Ok((Arc::new(TranscriptAnnouncer::stderr()), None));
    }

    let speech = Arc::new(CommandAnnouncer::spawn(command)?);
    Ok((Arc::clone(&speech) as Arc<dyn Announcer>, Some(speech)))
}
