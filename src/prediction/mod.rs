pub mod format;
pub mod labels;
pub mod result;

pub use format::{format, AllPredictions, ResponsePayload};
pub use labels::ClassLabel;
pub use result::{PredictionResult, ProbabilityVector};
