//! FoodFresh ML Service
//!
//! Serves freshness predictions over HTTP with a synchronous tiny_http server.
//!
//! Run with:
//!   cargo run --bin foodfresh-ml --release
//!
//! Endpoints:
//!   POST /predict   multipart field `image`
//!   GET  /health    status and whether trained weights are loaded
//!   GET  /classes   class taxonomy with safety advice
//!   GET  /          service metadata

mod handlers;
mod routes;
mod util;

use std::process::ExitCode;
use std::sync::Arc;

use tiny_http::Server;

use foodfresh::{logging, FreshnessService, ServiceConfig};

fn main() -> ExitCode {
    logging::init();

    let config = match ServiceConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    log::info!("Loading model from {}", config.model_path.display());
    // Weights are loaded before the first request is accepted and never
    // change afterwards.
    let service = Arc::new(FreshnessService::from_config(&config));

    let addr = config.bind_address();
    let server = match Server::http(&addr) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to bind HTTP server on {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    log::info!("ML Service starting on {}", addr);
    log::info!(
        "Classifier: {}",
        if service.model_loaded() { "trained model loaded" } else { "using demo mode" }
    );

    // Each request is dispatched on its own thread; the service is shared
    // read-only, so no request waits on another.
    let max_upload_bytes = config.max_upload_bytes;
    for request in server.incoming_requests() {
        let service = Arc::clone(&service);
        std::thread::spawn(move || {
            routes::dispatch(request, service, max_upload_bytes);
        });
    }

    ExitCode::SUCCESS
}
