use serde::Serialize;

use crate::classifier::{select_classifier, ClassifierMode, FreshnessClassifier};
use crate::config::ServiceConfig;
use crate::error::PredictError;
use crate::prediction::format::{format, ResponsePayload};
use crate::prediction::labels::ClassLabel;
use crate::preprocess::normalize;

pub const SERVICE_NAME: &str = "FoodFresh ML Service";
pub const SERVICE_VERSION: &str = "1.0.0";

/// `GET /health` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub model_loaded: bool,
    pub mode: ClassifierMode,
    pub message: &'static str,
}

/// `GET /` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub model_loaded: bool,
}

/// One entry of `GET /classes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassInfo {
    pub label: ClassLabel,
    pub index: usize,
    pub color: &'static str,
    pub advice: &'static str,
}

/// The inference pipeline behind the HTTP layer: normalize, classify, format.
///
/// Built once at startup and shared read-only between request threads.
pub struct FreshnessService {
    classifier: Box<dyn FreshnessClassifier>,
}

impl FreshnessService {
    pub fn new(classifier: Box<dyn FreshnessClassifier>) -> FreshnessService {
        FreshnessService { classifier }
    }

    /// Selects the classifier for `config.model_path`, falling back to demo mode.
    pub fn from_config(config: &ServiceConfig) -> FreshnessService {
        FreshnessService::new(select_classifier(&config.model_path))
    }

    pub fn mode(&self) -> ClassifierMode {
        self.classifier.mode()
    }

    pub fn model_loaded(&self) -> bool {
        self.mode() == ClassifierMode::Model
    }

    /// Runs one upload through the pipeline.
    pub fn predict(&self, raw: &[u8]) -> Result<ResponsePayload, PredictError> {
        let tensor = normalize(raw)?;
        let result = self.classifier.classify(&tensor)?;
        let payload = format(&result).with_mode(self.mode());
        log::info!("Prediction made: {} ({:.2}%)", payload.label, payload.confidence);
        Ok(payload)
    }

    pub fn health(&self) -> HealthStatus {
        let model_loaded = self.model_loaded();
        HealthStatus {
            status: "healthy",
            model_loaded,
            mode: self.mode(),
            message: if model_loaded {
                "ML Service is running with the trained model"
            } else {
                "Model not loaded: running in demo mode"
            },
        }
    }

    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            service: SERVICE_NAME,
            version: SERVICE_VERSION,
            status: "running",
            model_loaded: self.model_loaded(),
        }
    }

    pub fn classes() -> Vec<ClassInfo> {
        ClassLabel::ALL
            .iter()
            .map(|&label| ClassInfo { label, index: label.index(), color: label.color(), advice: label.advice() })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DemoClassifier;
    use crate::error::InferenceError;
    use crate::math::Tensor3;
    use crate::prediction::PredictionResult;
    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    struct Broken;

    impl FreshnessClassifier for Broken {
        fn classify(&self, _tensor: &Tensor3) -> Result<PredictionResult, InferenceError> {
            Err(InferenceError::OutputLength { expected: 3, found: 0 })
        }

        fn mode(&self) -> ClassifierMode {
            ClassifierMode::Model
        }
    }

    fn png() -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb([90, 140, 60])))
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn demo_service_answers_with_a_well_formed_payload() {
        let service = FreshnessService::new(Box::new(DemoClassifier::new()));
        let payload = service.predict(&png()).unwrap();
        assert_eq!(payload.mode, Some(ClassifierMode::Demo));
        let total: f64 = payload.all_predictions.0.iter().sum();
        assert!((total - 100.0).abs() < 1e-4);
        assert!(!service.health().model_loaded);
        assert_eq!(service.health().mode, ClassifierMode::Demo);
    }

    #[test]
    fn bad_bytes_are_client_errors() {
        let service = FreshnessService::new(Box::new(DemoClassifier::new()));
        let err = service.predict(b"0123456789").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.client_message().contains("Error preprocessing image"));
    }

    #[test]
    fn classifier_failures_are_server_errors() {
        let service = FreshnessService::new(Box::new(Broken));
        let err = service.predict(&png()).unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.client_message(), "Internal server error during prediction");
    }

    #[test]
    fn info_and_classes() {
        let service = FreshnessService::new(Box::new(Broken));
        let info = serde_json::to_value(service.info()).unwrap();
        assert_eq!(info, serde_json::json!({
            "service": "FoodFresh ML Service",
            "version": "1.0.0",
            "status": "running",
            "model_loaded": true
        }));
        let classes = FreshnessService::classes();
        assert_eq!(classes.len(), 3);
        assert_eq!(classes[2].color, "error");
    }
}
