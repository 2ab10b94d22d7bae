use std::path::PathBuf;
use std::time::Duration;

pub const APP_DIR: &str = "tokenkeeper";
pub const DEFAULT_REDIRECT_PORT: u16 = 4800;
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;

/// Runtime settings, built once at startup and handed to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub redirect_port: u16,
    pub callback_timeout: Duration,
}

impl Settings {
    /// Fill unset values with platform defaults (`~/.config/tokenkeeper`,
    /// `~/.cache/tokenkeeper` on Linux).
    pub fn resolve(
        config_dir: Option<PathBuf>,
        cache_dir: Option<PathBuf>,
        redirect_port: Option<u16>,
        callback_timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            config_dir: config_dir.unwrap_or_else(|| default_dir(dirs::config_dir())),
            cache_dir: cache_dir.unwrap_or_else(|| default_dir(dirs::cache_dir())),
            redirect_port: redirect_port.unwrap_or(DEFAULT_REDIRECT_PORT),
            callback_timeout: Duration::from_secs(
                callback_timeout_secs.unwrap_or(DEFAULT_CALLBACK_TIMEOUT_SECS),
            ),
        }
    }
}

fn default_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}
