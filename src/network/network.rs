use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{ModelUnavailableError, ShapeError};
use crate::layers::{Activations, Conv2d, Dense, Layer, MaxPool2d};
use crate::math::tensor::{Shape, Tensor3};
use crate::network::metadata::{InputType, ModelMetadata};
use crate::preprocess::{IMG_CHANNELS, IMG_SIZE};
use crate::prediction::labels::ClassLabel;

/// A sequential network evaluated in inference mode only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    pub fn new(layers: Vec<Layer>) -> Network {
        Network { layers, metadata: None }
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Network {
        self.metadata = Some(metadata);
        self
    }

    /// The freshness CNN: three conv/pool stages with 32, 64 and 128 filters,
    /// a 128-unit hidden layer, dropout and a softmax over the classes.
    /// Weights are freshly initialized.
    pub fn freshness_cnn() -> Network {
        Network::freshness_cnn_with([32, 64, 128], 128)
    }

    /// Same topology as `freshness_cnn()` with custom widths.
    pub fn freshness_cnn_with(filters: [usize; 3], hidden: usize) -> Network {
        let mut layers = Vec::new();
        let mut channels = IMG_CHANNELS;
        let mut side = IMG_SIZE;
        for f in filters {
            layers.push(Layer::Conv2d(Conv2d::new(f, 3, channels, ActivationFunction::ReLU)));
            layers.push(Layer::MaxPool2d(MaxPool2d::default()));
            channels = f;
            side = (side - 2) / 2;
        }
        layers.push(Layer::Flatten);
        layers.push(Layer::Dense(Dense::new(hidden, side * side * channels, ActivationFunction::ReLU)));
        layers.push(Layer::Dropout { rate: 0.5 });
        layers.push(Layer::Dense(Dense::new(ClassLabel::COUNT, hidden, ActivationFunction::Softmax)));

        Network::new(layers).with_metadata(ModelMetadata {
            description: Some("FoodFresh freshness CNN".to_owned()),
            input_type: Some(InputType::ImageRgb { width: IMG_SIZE as u32, height: IMG_SIZE as u32 }),
            output_labels: Some(ClassLabel::ALL.iter().map(|l| l.as_str().to_owned()).collect()),
        })
    }

    /// Propagates `input` through every layer, validating each one.
    pub fn output_shape(&self, input: Shape) -> Result<Shape, ShapeError> {
        self.layers
            .iter()
            .enumerate()
            .try_fold(input, |shape, (i, layer)| layer.output_shape(i, shape))
    }

    /// Index of the first layer holding NaN or infinite parameters.
    pub fn first_non_finite_layer(&self) -> Option<usize> {
        self.layers.iter().position(|l| !l.is_finite())
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Forward pass; pure with respect to `self`.
    pub fn forward(&self, input: &Tensor3) -> Result<Vec<f64>, ShapeError> {
        let mut current = Activations::Spatial(input.clone());
        for (i, layer) in self.layers.iter().enumerate() {
            current = layer.forward(i, current)?;
        }
        match current {
            Activations::Flat(v) => Ok(v),
            Activations::Spatial(t) => Ok(t.into_flat()),
        }
    }

    /// One line per layer: kind, output shape and parameter count.
    pub fn summary(&self, input: Shape) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.layers.len());
        let mut shape = Ok(input);
        for (i, layer) in self.layers.iter().enumerate() {
            shape = shape.and_then(|s| layer.output_shape(i, s));
            let described = match &shape {
                Ok(s) => s.to_string(),
                Err(e) => format!("invalid ({})", e),
            };
            let activation = match layer {
                Layer::Conv2d(c) => c.activator.name(),
                Layer::Dense(d) => d.activator.name(),
                _ => "",
            };
            lines.push(format!("{:>2}  {:<10} {:<8} -> {:<14} {} params",
                i, layer.kind(), activation, described, layer.parameter_count()));
        }
        lines
    }

    /// Serializes the network weights to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network, ModelUnavailableError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|source| ModelUnavailableError::Io { path: path.to_owned(), source })?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|source| ModelUnavailableError::Parse { path: path.to_owned(), source })
    }
}
