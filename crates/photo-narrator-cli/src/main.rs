//! Photo Narrator CLI - classify photos and speak what they show.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let result = match cli.command {
        Some(Commands::Classify(args)) => commands::classify::run(&args.with_config(&config)),
        Some(Commands::Interactive(args)) => {
            commands::interactive::run(&args.with_config(&config))
        }
        Some(Commands::Models(ref args)) => {
            commands::models::run(args, &config).map(|()| ExitCode::Success)
        }
        None => {
            // Default behavior: classify the positional paths
            if cli.classify.paths.is_empty() {
                eprintln!("error: No paths specified. Use --help for usage information.");
                return ExitCode::Error.into();
            }
            commands::classify::run(&cli.classify.with_config(&config))
        }
    };

    match result {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error.into()
        }
    }
}
