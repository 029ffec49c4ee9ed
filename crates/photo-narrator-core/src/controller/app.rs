//! The application controller.

use std::sync::Arc;

use candle_core::Tensor;
use tracing::{debug, info, warn};

use super::transition::{reduce, Transition};
use crate::domain::{
    AcquireOptions, Acquisition, AppState, ControllerError, FailureKind, ImageRef,
    ImageSourceKind, Prediction,
};
use crate::ports::{
    Classifier, ControllerEvent, EventSink, ImageAcquirer, ImageDecoder, ModelLoader,
};

/// Classification work for an acquired image.
///
/// Produced by [`Controller::request_image`]. It owns everything it needs,
/// so it can be run on another thread; the resulting transition must be fed
/// back through [`Controller::apply`].
pub struct PendingClassification {
    generation: u64,
    image: ImageRef,
    decoder: Arc<dyn ImageDecoder>,
    model: Arc<dyn Classifier>,
}

impl PendingClassification {
    /// Request generation this work belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Image to classify.
    #[must_use]
    pub const fn image(&self) -> &ImageRef {
        &self.image
    }

    /// Reads, decodes and classifies the image.
    #[must_use]
    pub fn run(self) -> Transition {
        let outcome = classify_image(self.decoder.as_ref(), self.model.as_ref(), &self.image);
        Transition::Classified {
            generation: self.generation,
            image: self.image,
            outcome,
        }
    }
}

fn classify_image(
    decoder: &dyn ImageDecoder,
    model: &dyn Classifier,
    image: &ImageRef,
) -> Result<Vec<Prediction>, FailureKind> {
    debug!("Reading {image}");
    let bytes = decoder
        .read(image)
        .map_err(|e| FailureKind::from_error(FailureKind::Read, &e))?;

    let tensor: Tensor = decoder
        .decode_to_tensor(&bytes)
        .map_err(|e| FailureKind::from_error(FailureKind::Decode, &e))?;

    debug!("Classifying {image} ({:?})", tensor.dims());
    model
        .classify(&tensor)
        .map_err(|e| FailureKind::from_error(FailureKind::Classify, &e))
}

/// Orchestrates model loading, acquisition, classification and announcement.
///
/// Holds the single [`AppState`]. Every change goes through [`apply`], which
/// drops transitions from superseded requests and notifies the registered
/// event sinks.
///
/// [`apply`]: Controller::apply
pub struct Controller {
    loader: Box<dyn ModelLoader>,
    acquirer: Box<dyn ImageAcquirer>,
    decoder: Arc<dyn ImageDecoder>,
    options: AcquireOptions,
    model: Option<Arc<dyn Classifier>>,
    sinks: Vec<Box<dyn EventSink>>,
    state: AppState,
}

impl Controller {
    /// Creates a controller in the `Initializing` phase.
    #[must_use]
    pub fn new(
        loader: Box<dyn ModelLoader>,
        acquirer: Box<dyn ImageAcquirer>,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Self {
        Self {
            loader,
            acquirer,
            decoder,
            options: AcquireOptions::default(),
            model: None,
            sinks: Vec::new(),
            state: AppState::default(),
        }
    }

    /// Sets the options passed to the acquirer.
    #[must_use]
    pub const fn with_options(mut self, options: AcquireOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers an event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Current state snapshot.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Initializes the runtime and loads the classifier.
    ///
    /// Runs once; later calls return immediately when a model is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`FailureKind::ModelLoad`] if either step fails. The failure
    /// is also recorded in the state.
    pub fn startup(&mut self) -> Result<(), FailureKind> {
        if self.model.is_some() {
            return Ok(());
        }

        info!("Initializing numeric runtime");
        if let Err(e) = self.loader.ready() {
            return Err(self.model_failed(&e));
        }
        self.apply(Transition::RuntimeReady);

        info!("Loading classifier");
        match self.loader.load() {
            Ok(model) => {
                self.model = Some(model);
                self.apply(Transition::ModelLoaded);
                info!("Classifier loaded");
                Ok(())
            }
            Err(e) => Err(self.model_failed(&e)),
        }
    }

    fn model_failed(&mut self, error: &anyhow::Error) -> FailureKind {
        let failure = FailureKind::from_error(FailureKind::ModelLoad, error);
        self.apply(Transition::ModelFailed(failure.clone()));
        failure
    }

    /// Asks the user for an image from `source`.
    ///
    /// Clears the previous image and predictions first. Returns the pending
    /// classification when an image was selected, `None` when the user
    /// cancelled or the acquirer failed.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::NotReady`] before the model is loaded.
    pub fn request_image(
        &mut self,
        source: ImageSourceKind,
    ) -> Result<Option<PendingClassification>, ControllerError> {
        let model = self.model.clone().ok_or(ControllerError::NotReady)?;

        let generation = self.state.generation + 1;
        self.apply(Transition::AcquisitionStarted { generation });

        info!("Requesting image from {source}");
        let acquisition = match source {
            ImageSourceKind::Gallery => self.acquirer.pick_from_library(&self.options),
            ImageSourceKind::Camera => self.acquirer.capture_from_camera(&self.options),
        };

        match acquisition {
            Ok(Acquisition::Cancelled) => {
                debug!("Acquisition {generation} cancelled");
                self.apply(Transition::AcquisitionCancelled { generation });
                Ok(None)
            }
            Ok(Acquisition::Selected(image)) => {
                self.apply(Transition::ImageAcquired {
                    generation,
                    image: image.clone(),
                });
                Ok(Some(PendingClassification {
                    generation,
                    image,
                    decoder: Arc::clone(&self.decoder),
                    model,
                }))
            }
            Err(e) => {
                let failure = FailureKind::from_error(FailureKind::Acquisition, &e);
                self.apply(Transition::AcquisitionFailed {
                    generation,
                    failure,
                });
                Ok(None)
            }
        }
    }

    /// Runs a pending classification on the current thread.
    ///
    /// The returned transition is not applied; pass it to [`apply`].
    ///
    /// [`apply`]: Controller::apply
    #[must_use]
    pub fn classify(&self, pending: PendingClassification) -> Transition {
        pending.run()
    }

    /// Requests an image and, if one was selected, classifies it and applies
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::NotReady`] before the model is loaded.
    pub fn request_and_classify(
        &mut self,
        source: ImageSourceKind,
    ) -> Result<&AppState, ControllerError> {
        if let Some(pending) = self.request_image(source)? {
            let transition = self.classify(pending);
            self.apply(transition);
        }
        Ok(&self.state)
    }

    /// Applies a transition and notifies the sinks.
    ///
    /// Returns `false` if the transition was stale and dropped.
    pub fn apply(&mut self, transition: Transition) -> bool {
        let failure = transition.failure().cloned();
        let had_predictions = self.state.predictions.is_some();

        let Some(next) = reduce(&self.state, transition) else {
            debug!(
                "Dropping stale transition (current generation {})",
                self.state.generation
            );
            return false;
        };
        self.state = next;

        self.emit(&ControllerEvent::StateChanged(self.state.clone()));

        if let Some(failure) = failure {
            warn!("{failure}");
            self.emit(&ControllerEvent::Failed { failure });
        }

        if !had_predictions {
            if let (Some(image), Some(predictions)) =
                (&self.state.current_image, &self.state.predictions)
            {
                self.emit(&ControllerEvent::PredictionsReady {
                    image: image.clone(),
                    predictions: predictions.clone(),
                });
            }
        }

        true
    }

    fn emit(&self, event: &ControllerEvent) {
        for sink in &self.sinks {
            sink.on_event(event.clone());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use candle_core::{DType, Device};

    use super::*;
    use crate::domain::Phase;

    struct FixedLoader {
        fail: bool,
    }

    impl ModelLoader for FixedLoader {
        fn ready(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn load(&self) -> anyhow::Result<Arc<dyn Classifier>> {
            if self.fail {
                anyhow::bail!("weights missing");
            }
            Ok(Arc::new(FixedClassifier))
        }
    }

    struct FixedClassifier;

    impl Classifier for FixedClassifier {
        fn classify(&self, _image: &Tensor) -> anyhow::Result<Vec<Prediction>> {
            Ok(vec![Prediction::new("cat", 0.9), Prediction::new("dog", 0.1)])
        }
    }

    struct ScriptedAcquirer(Mutex<VecDeque<Acquisition>>);

    impl ScriptedAcquirer {
        fn new(script: Vec<Acquisition>) -> Self {
            Self(Mutex::new(script.into()))
        }

        fn next(&self) -> Acquisition {
            self.0
                .lock()
                .ok()
                .and_then(|mut q| q.pop_front())
                .unwrap_or(Acquisition::Cancelled)
        }
    }

    impl ImageAcquirer for ScriptedAcquirer {
        fn pick_from_library(&self, _options: &AcquireOptions) -> anyhow::Result<Acquisition> {
            Ok(self.next())
        }

        fn capture_from_camera(&self, _options: &AcquireOptions) -> anyhow::Result<Acquisition> {
            Ok(self.next())
        }
    }

    struct BlankDecoder;

    impl ImageDecoder for BlankDecoder {
        fn read(&self, image: &ImageRef) -> anyhow::Result<Vec<u8>> {
            if image.uri().ends_with(".txt") {
                anyhow::bail!("not an image");
            }
            Ok(vec![0xFF, 0xD8])
        }

        fn decode_to_tensor(&self, _bytes: &[u8]) -> anyhow::Result<Tensor> {
            Ok(Tensor::zeros((3, 4, 4), DType::F32, &Device::Cpu)?)
        }
    }

    fn controller(script: Vec<Acquisition>) -> Controller {
        Controller::new(
            Box::new(FixedLoader { fail: false }),
            Box::new(ScriptedAcquirer::new(script)),
            Arc::new(BlankDecoder),
        )
    }

    #[test]
    fn test_request_before_startup_rejected() {
        let mut controller = controller(vec![]);
        let result = controller.request_image(ImageSourceKind::Gallery);
        assert!(matches!(result, Err(ControllerError::NotReady)));
        assert_eq!(controller.state().phase, Phase::Initializing);
    }

    #[test]
    fn test_startup_reaches_ready() {
        let mut controller = controller(vec![]);
        assert!(controller.startup().is_ok());
        assert_eq!(controller.state().phase, Phase::Ready);
        assert!(controller.state().model_ready);
    }

    #[test]
    fn test_startup_failure_recorded() {
        let mut controller = Controller::new(
            Box::new(FixedLoader { fail: true }),
            Box::new(ScriptedAcquirer::new(vec![])),
            Arc::new(BlankDecoder),
        );
        let result = controller.startup();
        assert!(matches!(result, Err(FailureKind::ModelLoad(_))));
        assert_eq!(controller.state().phase, Phase::Failed);
        assert!(controller.state().runtime_ready);
        assert!(!controller.state().model_ready);
    }

    #[test]
    fn test_selected_image_classified() {
        let mut controller = controller(vec![Acquisition::Selected(ImageRef::new("img1.jpg"))]);
        assert!(controller.startup().is_ok());

        let state = controller
            .request_and_classify(ImageSourceKind::Gallery)
            .cloned()
            .unwrap();

        assert_eq!(state.phase, Phase::Done);
        assert_eq!(state.labels(), vec!["cat", "dog"]);
        assert_eq!(state.current_image, Some(ImageRef::new("img1.jpg")));
    }

    #[test]
    fn test_read_failure_sets_error() {
        let mut controller = controller(vec![Acquisition::Selected(ImageRef::new("notes.txt"))]);
        assert!(controller.startup().is_ok());

        let state = controller
            .request_and_classify(ImageSourceKind::Camera)
            .cloned()
            .unwrap();

        assert_eq!(state.phase, Phase::Failed);
        assert!(state.predictions.is_none());
        assert!(matches!(state.error, Some(FailureKind::Read(_))));
    }

    #[test]
    fn test_superseded_classification_dropped() {
        let mut controller = controller(vec![
            Acquisition::Selected(ImageRef::new("img1.jpg")),
            Acquisition::Selected(ImageRef::new("img2.jpg")),
        ]);
        assert!(controller.startup().is_ok());

        let first = controller
            .request_image(ImageSourceKind::Gallery)
            .unwrap()
            .expect("first image selected");
        let second = controller
            .request_image(ImageSourceKind::Gallery)
            .unwrap()
            .expect("second image selected");

        let late = controller.classify(first);
        let fresh = controller.classify(second);

        assert!(controller.apply(fresh));
        assert!(!controller.apply(late));
        assert_eq!(
            controller.state().current_image,
            Some(ImageRef::new("img2.jpg"))
        );
        assert_eq!(controller.state().generation, 2);
    }

    #[test]
    fn test_pending_classification_runs_on_other_thread() {
        let mut controller = controller(vec![Acquisition::Selected(ImageRef::new("img1.jpg"))]);
        assert!(controller.startup().is_ok());

        let pending = controller
            .request_image(ImageSourceKind::Gallery)
            .unwrap()
            .expect("image selected");
        assert_eq!(pending.generation(), 1);

        let transition = std::thread::spawn(move || pending.run())
            .join()
            .unwrap();

        assert!(controller.apply(transition));
        assert_eq!(controller.state().phase, Phase::Done);
    }
}
