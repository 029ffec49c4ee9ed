//! Speech adapters: text-to-speech command and plain transcript.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::{Mutex, PoisonError};
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Sender};
use photo_narrator_core::Announcer;
use tracing::{debug, warn};

/// Returns the platform's usual text-to-speech command.
#[must_use]
pub const fn default_speech_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "say"
    } else {
        "espeak"
    }
}

/// Returns true if `program` resolves to an executable file on `PATH`.
#[must_use]
pub fn program_on_path(program: &str) -> bool {
    let program = Path::new(program);
    if program.components().count() > 1 {
        return program.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

/// Speaks phrases by running a TTS command once per phrase.
///
/// Phrases are queued on a channel and spoken by a single worker thread, so
/// `speak` never blocks and order is preserved.
pub struct CommandAnnouncer {
    sender: Mutex<Option<Sender<String>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CommandAnnouncer {
    /// Starts the speech worker for a whitespace-separated command line.
    ///
    /// The phrase is appended as the last argument.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is empty or the worker cannot start.
    pub fn spawn(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts.next().context("Speech command is empty")?;
        let args: Vec<String> = parts.collect();

        let (sender, receiver) = unbounded::<String>();
        let worker = std::thread::Builder::new()
            .name("speech".into())
            .spawn(move || {
                for text in receiver {
                    debug!("Speaking: {text}");
                    let status = Command::new(&program)
                        .args(&args)
                        .arg(&text)
                        .stdin(Stdio::null())
                        .stdout(Stdio::null())
                        .status();
                    match status {
                        Ok(s) if s.success() => {}
                        Ok(s) => warn!("Speech command {program} exited with {s}"),
                        Err(e) => warn!("Failed to run speech command {program}: {e}"),
                    }
                }
            })
            .context("Failed to start speech worker")?;

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Stops accepting phrases and waits until queued ones are spoken.
    pub fn finish(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                warn!("Speech worker panicked");
            }
        }
    }
}

impl Announcer for CommandAnnouncer {
    fn speak(&self, text: &str) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(tx) => {
                if tx.send(text.to_string()).is_err() {
                    warn!("Speech worker stopped; dropping {text:?}");
                }
            }
            None => warn!("Speech finished; dropping {text:?}"),
        }
    }
}

/// Writes each phrase as a line instead of speaking it.
pub struct TranscriptAnnouncer {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl TranscriptAnnouncer {
    /// Creates a transcript on stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a transcript on the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl Announcer for TranscriptAnnouncer {
    fn speak(&self, text: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "say: {text}").and_then(|()| writer.flush()) {
            warn!("Failed to write transcript: {e}");
        }
    }
}
