//! Gallery adapters: pick existing images from the filesystem.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use photo_narrator_core::{AcquireOptions, Acquisition, ImageRef, MediaTypes};
use tracing::{debug, warn};

/// Supported still image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "webp", "bmp", "gif"];
/// Video extensions a picker may offer under [`MediaTypes::All`].
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm", "avi", "mkv"];

/// Checks if a path passes the media type filter.
#[must_use]
pub fn matches_media_types(path: &Path, media_types: MediaTypes) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let is_image = IMAGE_EXTENSIONS.contains(&ext.as_str());
    let is_video = VIDEO_EXTENSIONS.contains(&ext.as_str());

    match media_types {
        MediaTypes::Images => is_image,
        MediaTypes::Videos => is_video,
        _ => is_image || is_video,
    }
}

/// Validates a picked path and turns it into a selection.
fn select(path: &Path, options: &AcquireOptions) -> Result<Acquisition> {
    if !path.is_file() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }
    if !matches_media_types(path, options.media_types) {
        anyhow::bail!(
            "{} does not match media filter {:?}",
            path.display(),
            options.media_types
        );
    }
    if options.allow_editing {
        debug!("Editing requested but not supported; using image as-is");
    }
    Ok(Acquisition::Selected(ImageRef::from_path(path)))
}

/// Where a [`PromptGallery`] reads its answers from.
enum Answers {
    Reader(Box<dyn BufRead + Send>),
    Lines(Receiver<String>),
}

impl Answers {
    /// Next answer, or `None` at end of input.
    fn read_answer(&mut self) -> Result<Option<String>> {
        match self {
            Self::Reader(reader) => {
                let mut line = String::new();
                let read = reader
                    .read_line(&mut line)
                    .context("Failed to read image path")?;
                Ok((read > 0).then_some(line))
            }
            Self::Lines(lines) => Ok(lines.recv().ok()),
        }
    }
}

/// Gallery that asks for a path on an interactive reader.
///
/// An empty line or end of input cancels the pick.
pub struct PromptGallery {
    answers: Mutex<Answers>,
    prompt: Mutex<Box<dyn Write + Send>>,
}

impl PromptGallery {
    /// Creates a gallery over the given reader and prompt writer.
    #[must_use]
    pub fn new(input: Box<dyn BufRead + Send>, prompt: Box<dyn Write + Send>) -> Self {
        Self {
            answers: Mutex::new(Answers::Reader(input)),
            prompt: Mutex::new(prompt),
        }
    }

    /// Creates a gallery answered by lines from a channel.
    ///
    /// Lets the gallery share one input stream with a key reader: whoever
    /// receives a line owns it. A disconnected channel is end of input.
    #[must_use]
    pub fn from_lines(lines: Receiver<String>, prompt: Box<dyn Write + Send>) -> Self {
        Self {
            answers: Mutex::new(Answers::Lines(lines)),
            prompt: Mutex::new(prompt),
        }
    }

    /// Prompts for a path and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the path is missing or filtered out.
    pub fn pick(&self, options: &AcquireOptions) -> Result<Acquisition> {
        {
            let mut prompt = self.prompt.lock().unwrap_or_else(PoisonError::into_inner);
            write!(prompt, "Image path (empty to cancel): ")?;
            prompt.flush()?;
        }

        let answer = self
            .answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read_answer()?;

        match answer.as_deref().map(str::trim) {
            None | Some("") => Ok(Acquisition::Cancelled),
            Some(path) => select(Path::new(path), options),
        }
    }
}

/// Gallery pre-seeded with paths, returning one per pick.
///
/// Once the queue is empty every pick is cancelled.
pub struct QueuedGallery {
    paths: Mutex<VecDeque<PathBuf>>,
}

impl QueuedGallery {
    /// Creates a gallery yielding `paths` in order.
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: Mutex::new(paths.into()),
        }
    }

    /// Number of paths not yet picked.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Takes the next path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is missing or filtered out.
    pub fn pick(&self, options: &AcquireOptions) -> Result<Acquisition> {
        let next = self
            .paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(path) => select(&path, options),
            None => {
                warn!("No more queued images");
                Ok(Acquisition::Cancelled)
            }
        }
    }
}

/// Gallery variants the CLI can use.
pub enum Gallery {
    /// Interactive path prompt.
    Prompt(PromptGallery),
    /// Paths given up front.
    Queued(QueuedGallery),
}

impl Gallery {
    /// Picks an image from the underlying gallery.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying gallery fails.
    pub fn pick(&self, options: &AcquireOptions) -> Result<Acquisition> {
        match self {
            Self::Prompt(g) => g.pick(options),
            Self::Queued(g) => g.pick(options),
        }
    }
}
