use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3001";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,

    // Upload body limit, exports are a single JSON document
    pub max_upload_bytes: usize,

    pub log_level: String, // e.g., "info", "debug", "crash_insights=trace"

    // Export file loaded before the first upload (optional)
    pub preload_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any variable source; `lookup` returns `None` for unset keys
    pub fn from_vars<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| format!("LISTEN_ADDR must be a socket address: {}", e))?;

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|e| format!("MAX_UPLOAD_BYTES must be a byte count: {}", e))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Config {
            listen_addr,
            max_upload_bytes,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            preload_path: lookup("PRELOAD_PATH").map(PathBuf::from),
        })
    }

    pub fn log_config(&self) {
        tracing::info!("📋 Configuration:");
        tracing::info!("   Listen Address: {}", self.listen_addr);
        tracing::info!("   Max Upload Bytes: {}", self.max_upload_bytes);
        tracing::info!("   Log Level: {}", self.log_level);
        if let Some(ref path) = self.preload_path {
            tracing::info!("   Preload Path: {}", path.display());
        }
    }
}
