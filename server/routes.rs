use std::io::{Cursor, Read};
use std::sync::Arc;

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use foodfresh::FreshnessService;

use crate::handlers;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// A response before it is handed to tiny_http. Handlers build these so they
/// can be tested without a socket.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// JSON body; empty for 204.
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiResponse {
    pub fn json<T: Serialize>(status: u16, value: &T) -> ApiResponse {
        match serde_json::to_vec(value) {
            Ok(body) => ApiResponse { status, body },
            Err(e) => {
                log::error!("Failed to serialize response: {}", e);
                ApiResponse::error(500, "Internal server error")
            }
        }
    }

    pub fn error(status: u16, message: &str) -> ApiResponse {
        let body = serde_json::to_vec(&ErrorBody { error: message })
            .unwrap_or_else(|_| br#"{"error":"Internal server error"}"#.to_vec());
        ApiResponse { status, body }
    }

    pub fn no_content() -> ApiResponse {
        ApiResponse { status: 204, body: Vec::new() }
    }

    pub fn not_found() -> ApiResponse {
        ApiResponse::error(404, "Not found")
    }

    pub fn method_not_allowed() -> ApiResponse {
        ApiResponse::error(405, "Method not allowed")
    }

    #[cfg(test)]
    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

/// Every response is JSON and carries permissive CORS headers.
fn into_http(resp: ApiResponse) -> Response<Cursor<Vec<u8>>> {
    let mut headers: Vec<Header> = [
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type, Accept"),
        ("Access-Control-Max-Age", "3600"),
    ]
    .iter()
    .filter_map(|(n, v)| header(n, v))
    .collect();
    if !resp.body.is_empty() {
        headers.extend(header("Content-Type", "application/json"));
    }

    let len = resp.body.len();
    Response::new(StatusCode(resp.status), headers, Cursor::new(resp.body), Some(len), None)
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Maps a parsed request onto its handler.
pub fn route(
    method: &Method,
    path: &str,
    content_type: &str,
    body: &[u8],
    service: &FreshnessService,
) -> ApiResponse {
    if *method == Method::Options {
        return ApiResponse::no_content();
    }

    match (method, path) {
        (Method::Get, "/")        => handlers::status::handle_index(service),
        (Method::Get, "/health")  => handlers::status::handle_health(service),
        (Method::Get, "/classes") => handlers::status::handle_classes(),
        (Method::Post, "/predict") => handlers::predict::handle(content_type, body, service),

        (_, "/" | "/health" | "/classes" | "/predict") => ApiResponse::method_not_allowed(),
        _ => ApiResponse::not_found(),
    }
}

/// Reads one request off the wire, routes it, and writes the response.
pub fn dispatch(mut request: Request, service: Arc<FreshnessService>, max_upload_bytes: usize) {
    let response = respond_to(&mut request, &service, max_upload_bytes);
    log::debug!("{} {} -> {}", request.method(), request.url(), response.status);
    if let Err(e) = request.respond(into_http(response)) {
        log::warn!("Failed to send response: {}", e);
    }
}

/// Builds the response for `request`. Only an upload to `/predict` has its
/// body read, so the size limit never masks a 404 or 405.
fn respond_to(request: &mut Request, service: &FreshnessService, max_upload_bytes: usize) -> ApiResponse {
    let method = request.method().clone();
    let path = request.url().split('?').next().unwrap_or("").to_owned();

    let content_type = request.headers().iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default();

    let body = if method == Method::Post && path == "/predict" {
        match read_body(request, max_upload_bytes) {
            Ok(body) => body,
            Err(resp) => return resp,
        }
    } else {
        Vec::new()
    };
    route(&method, &path, &content_type, &body, service)
}

/// Reads the body, refusing anything past `max_upload_bytes`.
fn read_body(request: &mut Request, max_upload_bytes: usize) -> Result<Vec<u8>, ApiResponse> {
    if request.body_length().map_or(false, |n| n > max_upload_bytes) {
        return Err(ApiResponse::error(413, "Upload too large"));
    }

    let mut body = Vec::new();
    let limit = max_upload_bytes as u64 + 1;
    if let Err(e) = request.as_reader().take(limit).read_to_end(&mut body) {
        log::warn!("Failed to read request body: {}", e);
        return Err(ApiResponse::error(400, "Could not read request body"));
    }
    if body.len() > max_upload_bytes {
        return Err(ApiResponse::error(413, "Upload too large"));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodfresh::DemoClassifier;
    use tiny_http::TestRequest;

    fn demo_service() -> FreshnessService {
        FreshnessService::new(Box::new(DemoClassifier::new()))
    }

    #[test]
    fn options_is_a_cors_preflight() {
        let resp = route(&Method::Options, "/predict", "", b"", &demo_service());
        assert_eq!(resp.status, 204);
        assert!(resp.body.is_empty());
    }

    #[test]
    fn unknown_paths_are_404_and_wrong_methods_405() {
        let service = demo_service();
        let resp = route(&Method::Get, "/nope", "", b"", &service);
        assert_eq!(resp.status, 404);
        assert_eq!(resp.json_body()["error"], "Not found");

        let resp = route(&Method::Get, "/predict", "", b"", &service);
        assert_eq!(resp.status, 405);
    }

    #[test]
    fn index_reports_service_metadata() {
        let resp = route(&Method::Get, "/", "", b"", &demo_service());
        assert_eq!(resp.status, 200);
        let body = resp.json_body();
        assert_eq!(body["service"], "FoodFresh ML Service");
        assert_eq!(body["version"], "1.0.0");
        assert_eq!(body["status"], "running");
        assert_eq!(body["model_loaded"], false);
    }

    #[test]
    fn http_response_carries_cors_and_json_headers() {
        let resp = into_http(ApiResponse::error(400, "No image file provided"));
        assert_eq!(resp.status_code(), StatusCode(400));
        let names: Vec<String> = resp.headers().iter().map(|h| h.field.to_string()).collect();
        assert!(names.iter().any(|n| n == "Access-Control-Allow-Origin"));
        assert!(names.iter().any(|n| n == "Content-Type"));
    }

    fn post(path: &str, body: &'static str) -> Request {
        TestRequest::new().with_method(Method::Post).with_path(path).with_body(body).into()
    }

    #[test]
    fn size_limit_applies_only_to_predict_uploads() {
        let service = demo_service();

        let mut request = post("/predict", "0123456789");
        assert_eq!(respond_to(&mut request, &service, 4).status, 413);

        let mut request = post("/nope", "0123456789");
        assert_eq!(respond_to(&mut request, &service, 4).status, 404);

        let mut request = post("/health", "0123456789");
        assert_eq!(respond_to(&mut request, &service, 4).status, 405);
    }

    #[test]
    fn small_predict_uploads_reach_the_handler() {
        let mut request = post("/predict?x=1", "{}");
        let resp = respond_to(&mut request, &demo_service(), 1024);
        assert_eq!(resp.status, 400);
        assert_eq!(resp.json_body()["error"], "No image file provided");
    }
}
