use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const BACKEND_URL_ENV: &str = "SEG_BACKEND_URL";

/// Process-wide settings, fixed at startup and passed to the client and
/// probe at construction. Never mutated at runtime.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_origin: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Config {
    pub fn new(backend_origin: impl Into<String>) -> Self {
        let origin = backend_origin.into();
        Self {
            backend_origin: origin.trim_end_matches('/').to_string(),
            connect_timeout: Duration::from_secs(10),
            // Inference on a CPU-only backend can take a while for large
            // uploads; generous but bounded.
            request_timeout: Duration::from_secs(120),
            probe_timeout: Duration::from_secs(5),
        }
    }

    /// Resolve the backend origin: CLI flag, then environment, then default.
    pub fn resolve_origin(flag: Option<String>) -> String {
        flag.or_else(|| std::env::var(BACKEND_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }
}
