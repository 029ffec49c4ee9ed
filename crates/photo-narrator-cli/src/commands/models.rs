//! Models command - manage the classifier weights and labels.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use clap::{Args, Subcommand};
use photo_narrator_adapters::models::{
    ensure_models_with_progress, list_models as adapter_list_models, models_dir, ProgressCallback,
};

use crate::config::AppConfig;
use crate::output::download_bar;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download required models
    Fetch,
    /// List installed models
    List,
    /// Print model directory path
    Path,
}

impl ModelsArgs {
    /// Resolves the models directory: CLI > config > default.
    fn dir(&self, config: &AppConfig) -> PathBuf {
        self.models_dir
            .clone()
            .or_else(|| config.models.dir.clone())
            .unwrap_or_else(models_dir)
    }
}

/// Run the models command.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<()> {
    let dir = args.dir(config);
    match args.command {
        ModelsCommand::Fetch => fetch_models(&dir),
        ModelsCommand::List => {
            list_models(&dir);
            Ok(())
        }
        ModelsCommand::Path => {
            println!("{}", dir.display());
            Ok(())
        }
    }
}

fn fetch_models(dir: &Path) -> Result<()> {
    let pb = Arc::new(download_bar()?);

    let current_model: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));
    let pb_clone = Arc::clone(&pb);
    let model_clone = Arc::clone(&current_model);

    let progress: ProgressCallback =
        Box::new(move |name: &str, downloaded: u64, total: Option<u64>| {
            let is_new_model = {
                let mut current = model_clone.lock().unwrap_or_else(PoisonError::into_inner);
                if *current == name {
                    false
                } else {
                    *current = name.to_string();
                    true
                }
            };
            if is_new_model {
                pb_clone.set_length(total.unwrap_or(0));
                pb_clone.set_message(name.to_string());
            }
            pb_clone.set_position(downloaded);
        });

    ensure_models_with_progress(dir, Some(&progress))?;

    pb.finish_with_message(format!("Models ready in {}", dir.display()));
    Ok(())
}

fn list_models(dir: &Path) {
    let models = adapter_list_models(dir);

    println!("Models directory: {}", dir.display());
    println!();

    for (info, installed) in &models {
        let status = if *installed { "✓" } else { "✗" };
        println!("  {status} {} ({})", info.name, info.filename);
    }

    println!();
    let installed_count = models.iter().filter(|(_, installed)| *installed).count();
    println!("{}/{} models installed", installed_count, models.len());
}
