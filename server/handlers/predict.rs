use std::panic::{catch_unwind, AssertUnwindSafe};

use foodfresh::{FreshnessService, InvalidInputError, PredictError};

use crate::routes::ApiResponse;
use crate::util::multipart::{extract_boundary, extract_file_field};

/// Name of the multipart field carrying the upload.
pub const IMAGE_FIELD: &str = "image";

/// `POST /predict`
///
/// Client mistakes (missing field, empty filename, undecodable image) answer
/// 400 with a descriptive message. Anything else, including a panic inside
/// the pipeline, answers a generic 500; the detail only goes to the log.
pub fn handle(content_type: &str, body: &[u8], service: &FreshnessService) -> ApiResponse {
    let upload = match extract_upload(content_type, body) {
        Ok(bytes) => bytes,
        Err(e) => return error_response(&PredictError::from(e)),
    };

    match catch_unwind(AssertUnwindSafe(|| service.predict(&upload))) {
        Ok(Ok(payload)) => ApiResponse::json(200, &payload),
        Ok(Err(e)) => error_response(&e),
        Err(_) => {
            log::error!("Prediction error: classifier panicked");
            ApiResponse::error(500, PredictError::INTERNAL_MESSAGE)
        }
    }
}

/// Pulls the `image` file part out of a multipart body.
pub fn extract_upload(content_type: &str, body: &[u8]) -> Result<Vec<u8>, InvalidInputError> {
    let part = extract_boundary(content_type)
        .and_then(|boundary| extract_file_field(body, &boundary, IMAGE_FIELD))
        .ok_or(InvalidInputError::MissingImage)?;
    if part.filename.is_empty() {
        return Err(InvalidInputError::EmptyFilename);
    }
    Ok(part.data)
}

fn error_response(e: &PredictError) -> ApiResponse {
    let status = e.status_code();
    if status >= 500 {
        log::error!("Prediction error: {}", e);
    } else {
        log::info!("Rejected upload: {}", e);
    }
    ApiResponse::error(status, &e.client_message())
}
