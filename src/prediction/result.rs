use crate::error::InferenceError;
use crate::prediction::labels::ClassLabel;

/// Per-class probabilities aligned with `ClassLabel::ALL`.
pub type ProbabilityVector = [f64; ClassLabel::COUNT];

/// Allowed deviation of a probability vector's sum from 1.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// Outcome of one classification. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    label: ClassLabel,
    confidence: f64,
    probabilities: ProbabilityVector,
}

impl PredictionResult {
    /// Picks the most probable class, preferring the lowest index on ties.
    ///
    /// Fails when any entry is negative or non-finite, or the entries do not
    /// sum to 1 within `SUM_TOLERANCE`.
    pub fn from_probabilities(probabilities: ProbabilityVector) -> Result<PredictionResult, InferenceError> {
        let sum: f64 = probabilities.iter().sum();
        let valid = probabilities.iter().all(|p| p.is_finite() && *p >= 0.0)
            && (sum - 1.0).abs() <= SUM_TOLERANCE;
        if !valid {
            return Err(InferenceError::InvalidDistribution(probabilities.to_vec()));
        }

        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate().skip(1) {
            if *p > probabilities[best] {
                best = i;
            }
        }
        Ok(PredictionResult {
            label: ClassLabel::ALL[best],
            confidence: probabilities[best],
            probabilities,
        })
    }

    /// Like `from_probabilities` for a slice of unknown length.
    pub fn from_slice(values: &[f64]) -> Result<PredictionResult, InferenceError> {
        let probabilities: ProbabilityVector = values.try_into().map_err(|_| InferenceError::OutputLength {
            expected: ClassLabel::COUNT,
            found: values.len(),
        })?;
        PredictionResult::from_probabilities(probabilities)
    }

    pub fn label(&self) -> ClassLabel {
        self.label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn probabilities(&self) -> &ProbabilityVector {
        &self.probabilities
    }

    pub fn probability(&self, label: ClassLabel) -> f64 {
        self.probabilities[label.index()]
    }

    /// `(label, probability)` pairs in class order.
    pub fn iter(&self) -> impl Iterator<Item = (ClassLabel, f64)> + '_ {
        ClassLabel::ALL.into_iter().zip(self.probabilities.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_the_argmax() {
        let r = PredictionResult::from_probabilities([0.1, 0.2, 0.7]).unwrap();
        assert_eq!(r.label(), ClassLabel::Spoiled);
        assert_eq!(r.confidence(), 0.7);
        assert_eq!(r.probability(ClassLabel::SemiSpoiled), 0.2);
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        let third = 1.0 / 3.0;
        let r = PredictionResult::from_probabilities([third, third, third]).unwrap();
        assert_eq!(r.label(), ClassLabel::Fresh);

        let r = PredictionResult::from_probabilities([0.2, 0.4, 0.4]).unwrap();
        assert_eq!(r.label(), ClassLabel::SemiSpoiled);
    }

    #[test]
    fn invalid_distributions_are_inference_errors() {
        for bad in [[0.5, 0.5, 0.5], [f64::NAN, 0.5, 0.5], [-0.1, 0.6, 0.5], [0.0, 0.0, 0.0]] {
            assert!(matches!(
                PredictionResult::from_probabilities(bad),
                Err(InferenceError::InvalidDistribution(_))
            ));
        }
    }

    #[test]
    fn wrong_length_is_reported() {
        let err = PredictionResult::from_slice(&[0.5, 0.5]).unwrap_err();
        assert_eq!(err, InferenceError::OutputLength { expected: 3, found: 2 });
    }

    #[test]
    fn iter_zips_labels_in_order() {
        let r = PredictionResult::from_probabilities([0.6, 0.3, 0.1]).unwrap();
        let labels: Vec<_> = r.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, ClassLabel::ALL.to_vec());
    }
}
