pub mod normalize;

pub use normalize::normalize;

/// Side length of the square classifier input.
pub const IMG_SIZE: usize = 224;
/// Colour channels of the classifier input (RGB).
pub const IMG_CHANNELS: usize = 3;
