//! Interactive command - choose or capture images from a keyboard menu.
//!
//! Keys stay live while an image is classified. A new request supersedes
//! the running one and its late result is dropped by the controller.

use std::io::BufRead;

use anyhow::{Context, Result};
use clap::Args;
use crossbeam_channel::{select_biased, unbounded, Receiver, Sender};
use photo_narrator_adapters::gallery::{Gallery, PromptGallery};
use photo_narrator_core::{Controller, ImageSourceKind, Transition};
use tracing::{debug, info, warn};

use super::session::{Session, SessionArgs};
use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{StatusLine, MENU};

/// Arguments for interactive mode.
#[derive(Args, Clone)]
pub struct InteractiveArgs {
    /// Controller and speech options.
    #[command(flatten)]
    pub session: SessionArgs,
}

impl InteractiveArgs {
    /// Apply configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.session = self.session.with_config(config);
        self
    }
}

/// A menu key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Gallery,
    Camera,
    Quit,
}

fn parse_key(line: &str) -> Option<Key> {
    match line.trim().to_ascii_lowercase().as_str() {
        "g" => Some(Key::Gallery),
        "c" => Some(Key::Camera),
        "q" => Some(Key::Quit),
        _ => None,
    }
}

/// Something the menu loop reacts to.
enum Event {
    Line(String),
    EndOfInput,
    Classified(Option<Transition>),
}

/// Forwards stdin lines to a channel until end of input.
fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = unbounded();
    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Failed to read input: {e}");
                        break;
                    }
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("Failed to start input reader")?;
    Ok(rx)
}

/// Run interactive mode until `q` or end of input.
pub fn run(args: &InteractiveArgs) -> Result<ExitCode> {
    let status = StatusLine::new(Box::new(std::io::stdout()));
    status.print("Loading...");

    let lines = spawn_stdin_reader()?;
    let gallery = Gallery::Prompt(PromptGallery::from_lines(
        lines.clone(),
        Box::new(std::io::stderr()),
    ));
    let mut session = Session::build(&args.session, gallery, vec![Box::new(status.clone())])?;

    // The status sink has already shown the failure.
    if let Err(failure) = session.controller.startup() {
        session.finish();
        return Err(failure.into());
    }

    let (results_tx, results_rx) = unbounded();
    loop {
        // Keys first, so a queued request supersedes a finishing one.
        let event = select_biased! {
            recv(lines) -> line => line.map_or(Event::EndOfInput, Event::Line),
            recv(results_rx) -> transition => Event::Classified(transition.ok()),
        };

        let line = match event {
            Event::Line(line) => line,
            Event::EndOfInput => {
                debug!("End of input");
                break;
            }
            Event::Classified(transition) => {
                if let Some(transition) = transition {
                    session.controller.apply(transition);
                }
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_key(&line) {
            Some(Key::Gallery) => {
                request(&mut session.controller, ImageSourceKind::Gallery, &results_tx)?;
            }
            Some(Key::Camera) => {
                request(&mut session.controller, ImageSourceKind::Camera, &results_tx)?;
            }
            Some(Key::Quit) => break,
            None => status.print(&format!("Unknown key '{}'. {MENU}", line.trim())),
        }
    }

    // Let running classifications finish so the last answer is still spoken.
    drop(results_tx);
    for transition in results_rx {
        session.controller.apply(transition);
    }

    session.finish();
    Ok(ExitCode::Success)
}

/// Acquires an image and starts classifying it on a worker thread.
///
/// The result arrives on `results` and is applied by the menu loop.
fn request(
    controller: &mut Controller,
    source: ImageSourceKind,
    results: &Sender<Transition>,
) -> Result<()> {
    let Some(pending) = controller.request_image(source)? else {
        return Ok(());
    };

    info!("Classifying {}", pending.image());
    let results = results.clone();
    std::thread::Builder::new()
        .name("classify".into())
        .spawn(move || {
            let generation = pending.generation();
            if results.send(pending.run()).is_err() {
                debug!("Discarding classification for generation {generation}");
            }
        })
        .context("Failed to start classification worker")?;
    Ok(())
}
