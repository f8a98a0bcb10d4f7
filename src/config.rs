use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_MODEL_PATH: &str = "trained_models/foodfresh.json";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Runtime settings, read from the environment once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Trained-weight artifact; a missing or unusable file selects demo mode.
    pub model_path: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServiceConfig {
    /// Loads `.env` if present, then reads `ML_HOST`, `ML_PORT`,
    /// `ML_MODEL_PATH` and `ML_MAX_UPLOAD_BYTES`.
    pub fn from_env() -> Result<ServiceConfig, ConfigError> {
        dotenv::dotenv().ok();
        ServiceConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Unset or blank
    /// variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<ServiceConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let mut config = ServiceConfig::default();

        if let Some(host) = get("ML_HOST") {
            config.host = host;
        }
        if let Some(port) = get("ML_PORT") {
            config.port = match port.parse::<u16>() {
                Ok(p) if p != 0 => p,
                Ok(_) => return Err(invalid("ML_PORT", port, "port must be non-zero".to_owned())),
                Err(e) => return Err(invalid("ML_PORT", port, e.to_string())),
            };
        }
        if let Some(path) = get("ML_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        if let Some(limit) = get("ML_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = limit
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid("ML_MAX_UPLOAD_BYTES", limit.clone(), e.to_string()))?;
        }
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn invalid(key: &'static str, value: String, reason: String) -> ConfigError {
    ConfigError { key, value, reason }
}
