/// Installs the `env_logger` backend, defaulting to `info` unless `RUST_LOG`
/// says otherwise. Safe to call more than once.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("info")).try_init();
}
