pub mod demo;
pub mod model;

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::InferenceError;
use crate::math::tensor::Tensor3;
use crate::prediction::result::PredictionResult;

pub use demo::DemoClassifier;
pub use model::ModelBackedClassifier;

/// Which classifier variant is serving predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    /// Trained weights are loaded.
    Model,
    /// Degraded mode: randomized, non-meaningful predictions.
    Demo,
}

impl fmt::Display for ClassifierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassifierMode::Model => "model",
            ClassifierMode::Demo => "demo",
        })
    }
}

/// Maps a normalized 224×224×3 tensor to a freshness prediction.
///
/// Implementations hold no per-request state and are shared across threads.
pub trait FreshnessClassifier: Send + Sync {
    fn classify(&self, tensor: &Tensor3) -> Result<PredictionResult, InferenceError>;

    fn mode(&self) -> ClassifierMode;
}

/// Loads trained weights from `model_path`, falling back to the demo
/// classifier when they cannot be used. Called once at startup.
pub fn select_classifier(model_path: &Path) -> Box<dyn FreshnessClassifier> {
    match ModelBackedClassifier::load(model_path) {
        Ok(classifier) => {
            log::info!(
                "Model loaded successfully from {} ({} parameters)",
                model_path.display(),
                classifier.network().parameter_count()
            );
            Box::new(classifier)
        }
        Err(e) => {
            log::warn!("Error loading model: {}", e);
            log::warn!("Falling back to demo mode: predictions are randomized");
            Box::new(DemoClassifier::new())
        }
    }
}
