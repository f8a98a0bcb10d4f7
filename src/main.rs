//! Offline freshness classification.
//!
//! Usage:
//!   foodfresh <weights.json> <image>...
//!
//! Prints the model summary, then one JSON payload per image. Falls back to
//! demo mode when the weights cannot be used, exactly like the server.

use std::path::Path;
use std::process::ExitCode;

use foodfresh::classifier::model::INPUT_SHAPE;
use foodfresh::{logging, DemoClassifier, FreshnessService, ModelBackedClassifier, Network};

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (weights, images) = match args.split_first() {
        Some((w, rest)) if !rest.is_empty() => (Path::new(w), rest),
        _ => {
            eprintln!("usage: foodfresh <weights.json> <image>...");
            return ExitCode::from(2);
        }
    };

    let loaded = Network::load_json(weights).and_then(|network| {
        for line in network.summary(INPUT_SHAPE) {
            println!("{}", line);
        }
        ModelBackedClassifier::new(network)
    });
    let service = match loaded {
        Ok(classifier) => FreshnessService::new(Box::new(classifier)),
        Err(e) => {
            log::warn!("{}; using demo mode", e);
            FreshnessService::new(Box::new(DemoClassifier::new()))
        }
    };

    let mut failed = false;
    for image in images {
        let outcome = std::fs::read(image)
            .map_err(|e| e.to_string())
            .and_then(|bytes| service.predict(&bytes).map_err(|e| e.to_string()));
        match outcome {
            Ok(payload) => match serde_json::to_string(&payload) {
                Ok(json) => println!("{}: {}", image, json),
                Err(e) => {
                    log::error!("{}: {}", image, e);
                    failed = true;
                }
            },
            Err(e) => {
                log::error!("{}: {}", image, e);
                failed = true;
            }
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
