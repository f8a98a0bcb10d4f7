use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Fully connected layer: `a = σ(x · W + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    pub size: usize,
    /// Shape `(input_size, size)`.
    pub weights: Matrix,
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
}

impl Dense {
    /// He-initialized weights for ReLU-family layers, Xavier otherwise; zero biases.
    pub fn new(size: usize, input_size: usize, activation: ActivationFunction) -> Dense {
        let weights = match activation {
            ActivationFunction::ReLU => Matrix::he(input_size, size),
            _ => Matrix::xavier(input_size, size),
        };
        Dense { size, weights, biases: vec![0.0; size], activator: activation }
    }

    pub fn from_parts(weights: Matrix, biases: Vec<f64>, activation: ActivationFunction) -> Dense {
        Dense { size: weights.cols, weights, biases, activator: activation }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Parameters actually stored, regardless of the declared shape.
    pub fn parameter_count(&self) -> usize {
        self.weights.data.iter().map(Vec::len).sum::<usize>() + self.biases.len()
    }

    /// Parameters the declared shape calls for, saturating on overflow.
    pub fn declared_parameter_count(&self) -> usize {
        self.input_size().saturating_mul(self.size).saturating_add(self.size)
    }

    pub fn is_consistent(&self) -> bool {
        self.weights.is_consistent() && self.weights.cols == self.size && self.biases.len() == self.size
    }

    pub fn is_finite(&self) -> bool {
        self.weights.is_finite() && self.biases.iter().all(|b| b.is_finite())
    }

    /// Caller guarantees `input.len() == self.input_size()`.
    pub fn feed_from(&self, input: &[f64]) -> Vec<f64> {
        let mut z = self.weights.vec_mul(input);
        for (v, b) in z.iter_mut().zip(self.biases.iter()) {
            *v += b;
        }
        self.activator.apply(&mut z);
        z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_from_applies_weights_bias_and_activation() {
        let layer = Dense::from_parts(
            Matrix::from_data(vec![vec![1.0, -1.0], vec![2.0, 0.5]]),
            vec![0.5, -3.0],
            ActivationFunction::ReLU,
        );
        // z = [1*1 + 2*2 + 0.5, 1*-1 + 2*0.5 - 3] = [5.5, -3]
        assert_eq!(layer.feed_from(&[1.0, 2.0]), vec![5.5, 0.0]);
    }

    #[test]
    fn new_layer_is_consistent() {
        let layer = Dense::new(4, 10, ActivationFunction::Softmax);
        assert!(layer.is_consistent());
        assert_eq!(layer.input_size(), 10);
        assert_eq!(layer.parameter_count(), 44);
        assert_eq!(layer.declared_parameter_count(), 44);
    }

    #[test]
    fn declared_shape_too_large_to_count_saturates() {
        let mut layer = Dense::new(2, 3, ActivationFunction::ReLU);
        layer.weights.rows = usize::MAX;
        assert!(!layer.is_consistent());
        assert_eq!(layer.declared_parameter_count(), usize::MAX);
        assert_eq!(layer.parameter_count(), 8);
    }
}
