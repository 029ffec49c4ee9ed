//! ML inference engine using Candle.
//!
//! Provides the MobileNet v1 ImageNet classifier, its loader, and the
//! shared weight-loading and device-selection helpers.

mod device;
mod labels;
mod loader;
mod mobilenet;
mod utils;

pub use device::{select_device, DevicePreference};
pub use labels::Labels;
pub use loader::load_tensors;
pub use mobilenet::{
    preprocess, MobileNet, MobileNetClassifier, MobileNetConfig, MobileNetLoader, DEFAULT_TOP_K,
    INPUT_SIZE,
};
pub use utils::top_k;
