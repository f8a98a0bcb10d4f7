use serde::{Serialize, Deserialize};
use std::f64::consts::E;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    /// Softmax is vector-valued; `apply()` normalizes the whole slice and
    /// `function()` is not defined for it.
    Softmax,
    Tanh,
}

impl ActivationFunction {
    /// Element-wise activation. Returns `x` unchanged for `Softmax`, which only
    /// makes sense over a whole vector; use `apply()` instead.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity | ActivationFunction::Softmax => x,
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Applies the activation in place over a layer's outputs.
    pub fn apply(&self, values: &mut [f64]) {
        match self {
            ActivationFunction::Softmax => softmax_in_place(values),
            ActivationFunction::Identity => {}
            other => values.iter_mut().for_each(|v| *v = other.function(*v)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Sigmoid => "sigmoid",
            ActivationFunction::ReLU => "relu",
            ActivationFunction::Identity => "identity",
            ActivationFunction::Softmax => "softmax",
            ActivationFunction::Tanh => "tanh",
        }
    }
}

/// Numerically stable softmax: shifts by the maximum before exponentiating.
fn softmax_in_place(values: &mut [f64]) {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}
