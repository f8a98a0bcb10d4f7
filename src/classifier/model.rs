use std::path::Path;

use crate::activation::activation::ActivationFunction;
use crate::classifier::{ClassifierMode, FreshnessClassifier};
use crate::error::{InferenceError, ModelUnavailableError};
use crate::layers::Layer;
use crate::math::tensor::{Shape, Tensor3};
use crate::network::metadata::InputType;
use crate::network::network::Network;
use crate::preprocess::{IMG_CHANNELS, IMG_SIZE};
use crate::prediction::labels::ClassLabel;
use crate::prediction::result::PredictionResult;

/// Shape every classifier input has after normalization.
pub const INPUT_SHAPE: Shape = Shape::Spatial { height: IMG_SIZE, width: IMG_SIZE, channels: IMG_CHANNELS };

/// Classifier backed by frozen network weights.
///
/// Construction validates the network once; `classify` is then a pure
/// function of the tensor and the weights.
#[derive(Debug)]
pub struct ModelBackedClassifier {
    network: Network,
}

impl ModelBackedClassifier {
    /// Reads and validates a model JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<ModelBackedClassifier, ModelUnavailableError> {
        let network = Network::load_json(path)?;
        ModelBackedClassifier::new(network)
    }

    /// Validates that `network` maps a 224×224×3 tensor to a softmax over the
    /// freshness classes and holds only finite parameters.
    pub fn new(network: Network) -> Result<ModelBackedClassifier, ModelUnavailableError> {
        let output = network.output_shape(INPUT_SHAPE)?;
        let ends_in_softmax = matches!(
            network.layers.last(),
            Some(Layer::Dense(d)) if d.activator == ActivationFunction::Softmax
        );
        if output != Shape::Flat(ClassLabel::COUNT) || !ends_in_softmax {
            return Err(ModelUnavailableError::Output {
                expected: ClassLabel::COUNT,
                found: format!("{} from a final {}", output, network.layers.last().map_or("nothing", Layer::kind)),
            });
        }
        if let Some(layer) = network.first_non_finite_layer() {
            return Err(ModelUnavailableError::NonFinite { layer });
        }

        if let Some(meta) = &network.metadata {
            if let Some(labels) = &meta.output_labels {
                let expected = ClassLabel::ALL.iter().map(|l| l.as_str());
                if !labels.iter().map(String::as_str).eq(expected) {
                    return Err(ModelUnavailableError::Labels { found: labels.clone() });
                }
            }
            match &meta.input_type {
                None => {}
                Some(InputType::ImageRgb { width, height })
                    if *width as usize == IMG_SIZE && *height as usize == IMG_SIZE => {}
                Some(other) => {
                    return Err(ModelUnavailableError::InputType { found: format!("{:?}", other) });
                }
            }
        }

        Ok(ModelBackedClassifier { network })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }
}

impl FreshnessClassifier for ModelBackedClassifier {
    fn classify(&self, tensor: &Tensor3) -> Result<PredictionResult, InferenceError> {
        let output = self.network.forward(tensor)?;
        PredictionResult::from_slice(&output)
    }

    fn mode(&self) -> ClassifierMode {
        ClassifierMode::Model
    }
}
