use serde::{Serialize, Deserialize};

use crate::math::tensor::Tensor3;

/// Max pooling with stride equal to the window and no padding; trailing rows
/// and columns that do not fill a window are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxPool2d {
    pub pool_size: usize,
}

impl Default for MaxPool2d {
    fn default() -> Self {
        MaxPool2d { pool_size: 2 }
    }
}

impl MaxPool2d {
    pub fn output_extent(&self, n: usize) -> Option<usize> {
        (self.pool_size > 0 && n >= self.pool_size).then(|| n / self.pool_size)
    }

    pub fn feed_from(&self, input: &Tensor3) -> Tensor3 {
        let p = self.pool_size;
        let out_h = input.height / p;
        let out_w = input.width / p;
        let mut out = Tensor3::zeros(out_h, out_w, input.channels);

        for oy in 0..out_h {
            for ox in 0..out_w {
                let start = out.index(oy, ox, 0);
                let acc = &mut out.data[start..start + input.channels];
                acc.fill(f64::NEG_INFINITY);
                for dy in 0..p {
                    for dx in 0..p {
                        for (a, &v) in acc.iter_mut().zip(input.pixel(oy * p + dy, ox * p + dx)) {
                            if v > *a {
                                *a = v;
                            }
                        }
                    }
                }
            }
        }
        out
    }
}
