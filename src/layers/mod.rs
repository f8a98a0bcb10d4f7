pub mod conv;
pub mod dense;
pub mod pool;

use serde::{Serialize, Deserialize};

use crate::error::ShapeError;
use crate::math::tensor::{Shape, Tensor3};

pub use conv::Conv2d;
pub use dense::Dense;
pub use pool::MaxPool2d;

/// One stage of a sequential network, stored in model JSON tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    Conv2d(Conv2d),
    MaxPool2d(MaxPool2d),
    Flatten,
    Dense(Dense),
    /// Regularization used only while training; a pass-through at inference.
    Dropout { rate: f64 },
}

/// Values flowing between layers.
#[derive(Debug, Clone, PartialEq)]
pub enum Activations {
    Spatial(Tensor3),
    Flat(Vec<f64>),
}

impl Activations {
    pub fn shape(&self) -> Shape {
        match self {
            Activations::Spatial(t) => t.shape(),
            Activations::Flat(v) => Shape::Flat(v.len()),
        }
    }
}

impl Layer {
    pub fn kind(&self) -> &'static str {
        match self {
            Layer::Conv2d(_) => "conv2d",
            Layer::MaxPool2d(_) => "max_pool2d",
            Layer::Flatten => "flatten",
            Layer::Dense(_) => "dense",
            Layer::Dropout { .. } => "dropout",
        }
    }

    pub fn parameter_count(&self) -> usize {
        match self {
            Layer::Conv2d(c) => c.parameter_count(),
            Layer::Dense(d) => d.parameter_count(),
            _ => 0,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Layer::Conv2d(c) => c.is_finite(),
            Layer::Dense(d) => d.is_finite(),
            Layer::Dropout { rate } => rate.is_finite(),
            _ => true,
        }
    }

    /// Checks this layer's parameters against `input` and returns the shape it
    /// produces. `index` is only used to label errors.
    pub fn output_shape(&self, index: usize, input: Shape) -> Result<Shape, ShapeError> {
        let kind = self.kind();
        let mismatch = |expected: String| ShapeError::Mismatch {
            layer: index,
            kind,
            expected,
            found: input.to_string(),
        };

        let output = match (self, input) {
            (Layer::Conv2d(c), Shape::Spatial { height, width, channels }) => {
                if channels != c.in_channels {
                    return Err(mismatch(format!("{} input channels", c.in_channels)));
                }
                let too_large = ShapeError::TooLarge { layer: index, kind };
                let kernel_len = c.expected_kernel_len().ok_or_else(|| too_large.clone())?;
                let expected = kernel_len.checked_add(c.filters).ok_or(too_large)?;
                if c.kernel.len() != kernel_len || c.biases.len() != c.filters {
                    return Err(ShapeError::ParameterCount {
                        layer: index,
                        kind,
                        expected,
                        found: c.parameter_count(),
                    });
                }
                match (c.output_extent(height), c.output_extent(width)) {
                    (Some(h), Some(w)) => Shape::Spatial { height: h, width: w, channels: c.filters },
                    _ => return Err(mismatch(format!("at least {0}x{0} spatial input", c.kernel_size))),
                }
            }
            (Layer::MaxPool2d(p), Shape::Spatial { height, width, channels }) => {
                match (p.output_extent(height), p.output_extent(width)) {
                    (Some(h), Some(w)) => Shape::Spatial { height: h, width: w, channels },
                    _ => return Err(mismatch(format!("at least {0}x{0} spatial input", p.pool_size))),
                }
            }
            (Layer::Flatten, shape) => Shape::Flat(shape.len()),
            (Layer::Dense(d), Shape::Flat(n)) => {
                if !d.is_consistent() {
                    return Err(ShapeError::ParameterCount {
                        layer: index,
                        kind,
                        expected: d.declared_parameter_count(),
                        found: d.parameter_count(),
                    });
                }
                if n != d.input_size() {
                    return Err(mismatch(format!("[{}]", d.input_size())));
                }
                Shape::Flat(d.size)
            }
            (Layer::Dropout { .. }, shape) => shape,
            (Layer::Conv2d(_) | Layer::MaxPool2d(_), Shape::Flat(_)) => {
                return Err(mismatch("a spatial input".to_owned()));
            }
            (Layer::Dense(_), Shape::Spatial { .. }) => {
                return Err(mismatch("a flat input".to_owned()));
            }
        };

        if output.is_empty() {
            return Err(ShapeError::Empty { layer: index, kind });
        }
        Ok(output)
    }

    /// Runs the layer in inference mode.
    pub fn forward(&self, index: usize, input: Activations) -> Result<Activations, ShapeError> {
        let expected = self.output_shape(index, input.shape())?;
        let output = match (self, input) {
            (Layer::Conv2d(c), Activations::Spatial(t)) => Activations::Spatial(c.feed_from(&t)),
            (Layer::MaxPool2d(p), Activations::Spatial(t)) => Activations::Spatial(p.feed_from(&t)),
            (Layer::Flatten, Activations::Spatial(t)) => Activations::Flat(t.into_flat()),
            (Layer::Flatten, flat @ Activations::Flat(_)) => flat,
            (Layer::Dense(d), Activations::Flat(v)) => Activations::Flat(d.feed_from(&v)),
            (Layer::Dropout { .. }, passthrough) => passthrough,
            // output_shape() above already rejected every other pairing.
            (_, other) => return Err(ShapeError::Mismatch {
                layer: index,
                kind: self.kind(),
                expected: expected.to_string(),
                found: other.shape().to_string(),
            }),
        };
        debug_assert_eq!(output.shape(), expected);
        Ok(output)
    }
}
