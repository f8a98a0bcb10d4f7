use std::fmt;

/// Dimensions of a feature map flowing through the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Height × width × channels, channels last.
    Spatial { height: usize, width: usize, channels: usize },
    /// A flat feature vector.
    Flat(usize),
}

impl Shape {
    pub fn len(&self) -> usize {
        match *self {
            Shape::Spatial { height, width, channels } => height * width * channels,
            Shape::Flat(n) => n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Spatial { height, width, channels } => write!(f, "{}x{}x{}", height, width, channels),
            Shape::Flat(n) => write!(f, "[{}]", n),
        }
    }
}

/// Dense H×W×C tensor stored row-major with channels innermost
/// (`data[(y * width + x) * channels + c]`), the layout Keras calls
/// channels-last.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor3 {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub data: Vec<f64>,
}

impl Tensor3 {
    pub fn zeros(height: usize, width: usize, channels: usize) -> Tensor3 {
        Tensor3 { height, width, channels, data: vec![0.0; height * width * channels] }
    }

    /// Wraps an existing buffer. Returns `None` when the length does not match the shape.
    pub fn from_data(height: usize, width: usize, channels: usize, data: Vec<f64>) -> Option<Tensor3> {
        (data.len() == height * width * channels).then_some(Tensor3 { height, width, channels, data })
    }

    pub fn shape(&self) -> Shape {
        Shape::Spatial { height: self.height, width: self.width, channels: self.channels }
    }

    #[inline]
    pub fn index(&self, y: usize, x: usize, c: usize) -> usize {
        (y * self.width + x) * self.channels + c
    }

    #[inline]
    pub fn get(&self, y: usize, x: usize, c: usize) -> f64 {
        self.data[self.index(y, x, c)]
    }

    /// The channel values at one pixel.
    #[inline]
    pub fn pixel(&self, y: usize, x: usize) -> &[f64] {
        let start = self.index(y, x, 0);
        &self.data[start..start + self.channels]
    }

    pub fn into_flat(self) -> Vec<f64> {
        self.data
    }
}
