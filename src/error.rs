use std::path::PathBuf;
use thiserror::Error;

/// The upload itself is missing or unusable (client error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    #[error("No image file provided")]
    MissingImage,
    #[error("No image file selected")]
    EmptyFilename,
}

/// The uploaded bytes could not be decoded or normalized into a tensor.
///
/// The message is passed through to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error preprocessing image: {reason}")]
pub struct InvalidImageError {
    reason: String,
}

impl InvalidImageError {
    pub fn new(reason: impl Into<String>) -> Self {
        InvalidImageError { reason: reason.into() }
    }
}

/// A layer chain that does not line up with the shape flowing into it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("layer {layer} ({kind}) expects {expected}, got {found}")]
    Mismatch {
        layer: usize,
        kind: &'static str,
        expected: String,
        found: String,
    },
    #[error("layer {layer} ({kind}) holds {found} parameters, expected {expected}")]
    ParameterCount {
        layer: usize,
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("layer {layer} ({kind}) declares dimensions too large to address")]
    TooLarge { layer: usize, kind: &'static str },
    #[error("layer {layer} ({kind}) would produce an empty output")]
    Empty { layer: usize, kind: &'static str },
}

/// Trained weights could not be used. Never reaches a client: the service
/// falls back to the demo classifier instead.
#[derive(Debug, Error)]
pub enum ModelUnavailableError {
    #[error("could not open weights at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("weights at {} are not a valid model: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model architecture does not fit the classifier: {0}")]
    Shape(#[from] ShapeError),
    #[error("model output must be a {expected}-way softmax, found {found}")]
    Output { expected: usize, found: String },
    #[error("layer {layer} contains non-finite parameters")]
    NonFinite { layer: usize },
    #[error("model labels {found:?} do not match the freshness classes")]
    Labels { found: Vec<String> },
    #[error("model declares input {found}, classifier feeds 224x224 RGB")]
    InputType { found: String },
}

/// Something went wrong while evaluating a classifier (server error).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("forward pass failed: {0}")]
    Shape(#[from] ShapeError),
    #[error("classifier produced {found} outputs, expected {expected}")]
    OutputLength { expected: usize, found: usize },
    #[error("classifier produced an invalid distribution {0:?}")]
    InvalidDistribution(Vec<f64>),
}

/// Every failure a single prediction request can end in.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
    #[error(transparent)]
    InvalidImage(#[from] InvalidImageError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PredictError {
    pub const INTERNAL_MESSAGE: &'static str = "Internal server error during prediction";

    /// HTTP status the façade answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            PredictError::InvalidInput(_) | PredictError::InvalidImage(_) => 400,
            PredictError::Inference(_) => 500,
        }
    }

    /// Message safe to return to the caller; internal detail stays in the log.
    pub fn client_message(&self) -> String {
        match self {
            PredictError::InvalidInput(e) => e.to_string(),
            PredictError::InvalidImage(e) => e.to_string(),
            PredictError::Inference(_) => Self::INTERNAL_MESSAGE.to_owned(),
        }
    }
}

/// A recognized environment variable carries a value that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_pass_their_message_through() {
        let err = PredictError::from(InvalidImageError::new("bad magic"));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.client_message(), "Error preprocessing image: bad magic");

        let err = PredictError::from(InvalidInputError::EmptyFilename);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.client_message(), "No image file selected");
    }

    #[test]
    fn inference_errors_hide_their_detail() {
        let err = PredictError::from(InferenceError::OutputLength { expected: 3, found: 7 });
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.client_message(), PredictError::INTERNAL_MESSAGE);
        assert!(err.to_string().contains("7 outputs"));
    }
}
