use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::classifier::ClassifierMode;
use crate::prediction::labels::ClassLabel;
use crate::prediction::result::{PredictionResult, ProbabilityVector};

/// Response body of a successful `POST /predict`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResponsePayload {
    pub label: ClassLabel,
    /// Percentage, rounded to two decimals.
    pub confidence: f64,
    /// Percentages per class, left at full precision.
    pub all_predictions: AllPredictions,
    /// Present only when the demo classifier answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ClassifierMode>,
}

impl ResponsePayload {
    pub fn with_mode(mut self, mode: ClassifierMode) -> ResponsePayload {
        self.mode = (mode == ClassifierMode::Demo).then_some(mode);
        self
    }
}

/// Per-class percentages, serialized as a JSON object keyed by label in class order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllPredictions(pub ProbabilityVector);

impl AllPredictions {
    pub fn get(&self, label: ClassLabel) -> f64 {
        self.0[label.index()]
    }
}

impl Serialize for AllPredictions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ClassLabel::COUNT))?;
        for (label, value) in ClassLabel::ALL.iter().zip(self.0.iter()) {
            map.serialize_entry(label.as_str(), value)?;
        }
        map.end()
    }
}

/// Converts a prediction into its response payload.
///
/// Only `confidence` is rounded; the per-class values keep full precision so
/// existing consumers keep seeing the same numbers.
pub fn format(result: &PredictionResult) -> ResponsePayload {
    ResponsePayload {
        label: result.label(),
        confidence: round2(result.confidence() * 100.0),
        all_predictions: AllPredictions(result.probabilities().map(|p| p * 100.0)),
        mode: None,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
