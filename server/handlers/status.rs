use foodfresh::FreshnessService;

use crate::routes::ApiResponse;

/// `GET /`
pub fn handle_index(service: &FreshnessService) -> ApiResponse {
    ApiResponse::json(200, &service.info())
}

/// `GET /health`: whether trained weights or demo mode is serving.
pub fn handle_health(service: &FreshnessService) -> ApiResponse {
    ApiResponse::json(200, &service.health())
}

/// `GET /classes`
pub fn handle_classes() -> ApiResponse {
    ApiResponse::json(200, &FreshnessService::classes())
}
