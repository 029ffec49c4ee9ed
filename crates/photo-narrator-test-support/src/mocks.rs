//! Mock implementations of core port traits.
//!
//! Every mock is `Clone` and shares its recorded state between clones, so a
//! test can hand one clone to the controller and assert on another.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::anyhow;
use candle_core::{DType, Device, Tensor};
use photo_narrator_core::{
    AcquireOptions, Acquisition, Announcer, Classifier, ControllerEvent, EventSink,
    ImageAcquirer, ImageDecoder, ImageRef, ModelLoader, Prediction,
};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock implementation of `Classifier` for testing.
///
/// Returns scripted results in order; once the script runs out the last
/// result repeats.
#[derive(Clone)]
pub struct MockClassifier {
    script: Arc<Mutex<VecDeque<Result<Vec<Prediction>, String>>>>,
    last: Arc<Mutex<Result<Vec<Prediction>, String>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockClassifier {
    /// Creates a classifier that always returns the given labels with
    /// descending confidences.
    #[must_use]
    pub fn labels(labels: &[&str]) -> Self {
        Self::predictions(predictions(labels))
    }

    /// Creates a classifier that always returns `predictions`.
    #[must_use]
    pub fn predictions(predictions: Vec<Prediction>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            last: Arc::new(Mutex::new(Ok(predictions))),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates a classifier that always fails with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        let classifier = Self::predictions(Vec::new());
        *lock(&classifier.last) = Err(message.to_string());
        classifier
    }

    /// Queues a result for the next call.
    #[must_use]
    pub fn then(self, result: Result<Vec<Prediction>, &str>) -> Self {
        lock(&self.script).push_back(result.map_err(String::from));
        self
    }

    /// Returns the number of `classify` calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *lock(&self.calls)
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, _image: &Tensor) -> anyhow::Result<Vec<Prediction>> {
        *lock(&self.calls) += 1;
        let result = match lock(&self.script).pop_front() {
            Some(result) => {
                *lock(&self.last) = result.clone();
                result
            }
            None => lock(&self.last).clone(),
        };
        result.map_err(|message| anyhow!(message))
    }
}

/// Builds predictions for `labels` with confidences 0.9, 0.8, ...
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn predictions(labels: &[&str]) -> Vec<Prediction> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| Prediction::new(*label, 0.9 - 0.1 * i as f32))
        .collect()
}

/// Mock implementation of `ModelLoader` for testing.
#[derive(Clone)]
pub struct MockModelLoader {
    classifier: MockClassifier,
    ready_error: Option<String>,
    load_error: Option<String>,
    load_count: Arc<Mutex<usize>>,
}

impl MockModelLoader {
    /// Creates a loader handing out `classifier`.
    #[must_use]
    pub fn new(classifier: MockClassifier) -> Self {
        Self {
            classifier,
            ready_error: None,
            load_error: None,
            load_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Makes `ready` fail with `message`.
    #[must_use]
    pub fn failing_ready(mut self, message: &str) -> Self {
        self.ready_error = Some(message.to_string());
        self
    }

    /// Makes `load` fail with `message`.
    #[must_use]
    pub fn failing_load(mut self, message: &str) -> Self {
        self.load_error = Some(message.to_string());
        self
    }

    /// Returns the number of `load` calls.
    #[must_use]
    pub fn load_count(&self) -> usize {
        *lock(&self.load_count)
    }
}

impl ModelLoader for MockModelLoader {
    fn ready(&self) -> anyhow::Result<()> {
        match &self.ready_error {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(()),
        }
    }

    fn load(&self) -> anyhow::Result<Arc<dyn Classifier>> {
        *lock(&self.load_count) += 1;
        match &self.load_error {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(Arc::new(self.classifier.clone())),
        }
    }
}

/// Which acquirer entry point was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireCall {
    /// `pick_from_library`
    Library,
    /// `capture_from_camera`
    Camera,
}

/// Mock implementation of `ImageAcquirer` for testing.
///
/// Both entry points pop from the same script. An empty script cancels.
#[derive(Clone, Default)]
pub struct MockAcquirer {
    script: Arc<Mutex<VecDeque<Result<Acquisition, String>>>>,
    calls: Arc<Mutex<Vec<(AcquireCall, AcquireOptions)>>>,
}

impl MockAcquirer {
    /// Creates an acquirer with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a selection of `uri`.
    #[must_use]
    pub fn selecting(self, uri: &str) -> Self {
        lock(&self.script).push_back(Ok(Acquisition::Selected(ImageRef::new(uri))));
        self
    }

    /// Queues a cancellation.
    #[must_use]
    pub fn cancelling(self) -> Self {
        lock(&self.script).push_back(Ok(Acquisition::Cancelled));
        self
    }

    /// Queues a failure.
    #[must_use]
    pub fn failing(self, message: &str) -> Self {
        lock(&self.script).push_back(Err(message.to_string()));
        self
    }

    /// Returns every call made, with the options passed.
    #[must_use]
    pub fn calls(&self) -> Vec<(AcquireCall, AcquireOptions)> {
        lock(&self.calls).clone()
    }

    fn next(&self, call: AcquireCall, options: &AcquireOptions) -> anyhow::Result<Acquisition> {
        lock(&self.calls).push((call, *options));
        match lock(&self.script).pop_front() {
            Some(Ok(acquisition)) => Ok(acquisition),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(Acquisition::Cancelled),
        }
    }
}

impl ImageAcquirer for MockAcquirer {
    fn pick_from_library(&self, options: &AcquireOptions) -> anyhow::Result<Acquisition> {
        self.next(AcquireCall::Library, options)
    }

    fn capture_from_camera(&self, options: &AcquireOptions) -> anyhow::Result<Acquisition> {
        self.next(AcquireCall::Camera, options)
    }
}

/// Mock implementation of `ImageDecoder` for testing.
///
/// `read` returns the URI as bytes. URIs ending in `.txt` fail to decode and
/// URIs containing `missing` fail to read.
#[derive(Clone, Default)]
pub struct MockDecoder {
    reads: Arc<Mutex<Vec<ImageRef>>>,
}

impl MockDecoder {
    /// Creates a new mock decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every image read, in order.
    #[must_use]
    pub fn reads(&self) -> Vec<ImageRef> {
        lock(&self.reads).clone()
    }
}

impl ImageDecoder for MockDecoder {
    fn read(&self, image: &ImageRef) -> anyhow::Result<Vec<u8>> {
        lock(&self.reads).push(image.clone());
        if image.uri().contains("missing") {
            return Err(anyhow!("No such file: {image}"));
        }
        Ok(image.uri().as_bytes().to_vec())
    }

    fn decode_to_tensor(&self, bytes: &[u8]) -> anyhow::Result<Tensor> {
        if bytes.ends_with(b".txt") {
            return Err(anyhow!("Unsupported image format"));
        }
        Ok(Tensor::zeros((3, 4, 4), DType::F32, &Device::Cpu)?)
    }
}

/// Mock implementation of `Announcer` for testing.
///
/// Captures phrases for later assertions.
#[derive(Clone, Default)]
pub struct RecordingAnnouncer {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingAnnouncer {
    /// Creates a new recording announcer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all spoken phrases in order.
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        lock(&self.spoken).clone()
    }
}

impl Announcer for RecordingAnnouncer {
    fn speak(&self, text: &str) {
        lock(&self.spoken).push(text.to_string());
    }
}

/// Mock implementation of `EventSink` for testing.
///
/// Captures events for later assertions.
#[derive(Clone, Default)]
pub struct MockEventSink {
    events: Arc<Mutex<Vec<ControllerEvent>>>,
}

impl MockEventSink {
    /// Creates a new mock event sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ControllerEvent> {
        lock(&self.events).clone()
    }

    /// Returns the number of `PredictionsReady` events.
    #[must_use]
    pub fn predictions_ready_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ControllerEvent::PredictionsReady { .. }))
            .count()
    }

    /// Returns the number of `Failed` events.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ControllerEvent::Failed { .. }))
            .count()
    }
}

impl EventSink for MockEventSink {
    fn on_event(&self, event: ControllerEvent) {
        lock(&self.events).push(event);
    }
}
