pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod preprocess;
pub mod prediction;
pub mod classifier;
pub mod service;
pub mod config;
pub mod error;
pub mod logging;

// Convenience re-exports
pub use math::{Matrix, Shape, Tensor3};
pub use activation::ActivationFunction;
pub use layers::{Conv2d, Dense, Layer, MaxPool2d};
pub use network::{InputType, ModelMetadata, Network};
pub use preprocess::normalize;
pub use prediction::{format, ClassLabel, PredictionResult, ResponsePayload};
pub use classifier::{ClassifierMode, DemoClassifier, FreshnessClassifier, ModelBackedClassifier};
pub use service::FreshnessService;
pub use config::ServiceConfig;
pub use error::{ConfigError, InferenceError, InvalidImageError, InvalidInputError, ModelUnavailableError, PredictError};
