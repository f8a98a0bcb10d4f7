use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::math::matrix::he_vec;
use crate::math::tensor::Tensor3;

/// 2-D convolution, stride 1, no padding ("valid").
///
/// `kernel` is laid out `[ky][kx][in_channel][filter]` (HWIO), the same order
/// Keras stores `Conv2D` kernels in, so exported weights copy over unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conv2d {
    pub filters: usize,
    pub kernel_size: usize,
    pub in_channels: usize,
    pub kernel: Vec<f64>,
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
}

impl Conv2d {
    /// He-initialized kernel with zero biases.
    pub fn new(filters: usize, kernel_size: usize, in_channels: usize, activation: ActivationFunction) -> Conv2d {
        let fan_in = kernel_size * kernel_size * in_channels;
        Conv2d {
            filters,
            kernel_size,
            in_channels,
            kernel: he_vec(fan_in * filters, fan_in),
            biases: vec![0.0; filters],
            activator: activation,
        }
    }

    /// Kernel length implied by the declared dimensions, or `None` if it
    /// does not fit in `usize`.
    pub fn expected_kernel_len(&self) -> Option<usize> {
        self.kernel_size
            .checked_mul(self.kernel_size)?
            .checked_mul(self.in_channels)?
            .checked_mul(self.filters)
    }

    pub fn parameter_count(&self) -> usize {
        self.kernel.len() + self.biases.len()
    }

    pub fn is_finite(&self) -> bool {
        self.kernel.iter().chain(self.biases.iter()).all(|v| v.is_finite())
    }

    /// Output side length for an input side of `n`, or `None` if the kernel does not fit.
    pub fn output_extent(&self, n: usize) -> Option<usize> {
        (self.kernel_size > 0 && n >= self.kernel_size).then(|| n - self.kernel_size + 1)
    }

    /// Caller guarantees `input.channels == self.in_channels` and that the kernel fits.
    pub fn feed_from(&self, input: &Tensor3) -> Tensor3 {
        let k = self.kernel_size;
        let out_h = input.height - k + 1;
        let out_w = input.width - k + 1;
        let mut out = Tensor3::zeros(out_h, out_w, self.filters);

        for oy in 0..out_h {
            for ox in 0..out_w {
                let start = out.index(oy, ox, 0);
                let acc = &mut out.data[start..start + self.filters];
                acc.copy_from_slice(&self.biases);

                for ky in 0..k {
                    for kx in 0..k {
                        let px = input.pixel(oy + ky, ox + kx);
                        let tap = (ky * k + kx) * self.in_channels;
                        for (ic, &v) in px.iter().enumerate() {
                            if v == 0.0 {
                                continue;
                            }
                            let w0 = (tap + ic) * self.filters;
                            let weights = &self.kernel[w0..w0 + self.filters];
                            for (a, w) in acc.iter_mut().zip(weights) {
                                *a += v * w;
                            }
                        }
                    }
                }
                self.activator.apply(acc);
            }
        }
        out
    }
}
