//! Output formatting for CLI.

mod json;
mod progress;
mod status;

pub use json::{JsonOutput, PredictionRecord};
pub use progress::{download_bar, Spinner};
pub use status::{StatusLine, MENU};
