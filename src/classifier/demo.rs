use rand::Rng;

use crate::classifier::{ClassifierMode, FreshnessClassifier};
use crate::error::InferenceError;
use crate::math::tensor::Tensor3;
use crate::prediction::labels::ClassLabel;
use crate::prediction::result::{PredictionResult, ProbabilityVector};

/// Fallback used when no trained weights are available.
///
/// Ignores the image and draws three uniform values normalized to sum to 1.
/// This keeps the service answering; the output carries no meaning.
#[derive(Debug, Default)]
pub struct DemoClassifier;

impl DemoClassifier {
    pub fn new() -> DemoClassifier {
        DemoClassifier
    }

    /// Draws one random distribution from `rng`.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> ProbabilityVector {
        let draws: ProbabilityVector = std::array::from_fn(|_| rng.gen::<f64>());
        let total: f64 = draws.iter().sum();
        if total > 0.0 {
            draws.map(|d| d / total)
        } else {
            [1.0 / ClassLabel::COUNT as f64; ClassLabel::COUNT]
        }
    }
}

impl FreshnessClassifier for DemoClassifier {
    fn classify(&self, _tensor: &Tensor3) -> Result<PredictionResult, InferenceError> {
        PredictionResult::from_probabilities(DemoClassifier::sample(&mut rand::thread_rng()))
    }

    fn mode(&self) -> ClassifierMode {
        ClassifierMode::Demo
    }
}
