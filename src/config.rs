use std::path::PathBuf;

use serde::Serialize;

const STORE_FILE_NAME: &str = "recording.pcm";

#[derive(Debug, Serialize, Clone)]
pub struct Config {
    pub app_name: &'static str,
    pub app_version: &'static str,

    // ALSA PCM names
    pub capture_device: String,
    pub playback_device: String,

    /// Location of the raw PCM store.
    pub store_path: PathBuf,

    // Permission defaults
    pub capture_granted: bool,
    pub grant_on_request: bool,
}

impl Config {
    /// Build the configuration from the env vars baked in by build.rs
    /// (all values originate from config.toml).
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),

            capture_device: env!("CAPTURE_DEVICE").to_string(),
            playback_device: env!("PLAYBACK_DEVICE").to_string(),

            store_path: resolve_store_path(env!("STORE_PATH")),

            capture_granted: env!("CAPTURE_GRANTED").parse()
                .map_err(|_| "Failed to parse CAPTURE_GRANTED")?,
            grant_on_request: env!("GRANT_ON_REQUEST").parse()
                .map_err(|_| "Failed to parse GRANT_ON_REQUEST")?,
        })
    }
}

/// An empty path selects the per-user cache file (temp dir without a home).
fn resolve_store_path(configured: &str) -> PathBuf {
    if !configured.trim().is_empty() {
        return PathBuf::from(configured);
    }
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(env!("APP_NAME"))
        .join(STORE_FILE_NAME)
}
