use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TokenkeeperError {
    #[error("Error in profile {}: {detail}", path.display())]
    ConfigError { path: PathBuf, detail: String },

    #[error("{}", format_profile_not_found(.name, .suggestion.as_deref()))]
    ProfileNotFound {
        name: String,
        suggestion: Option<String>,
    },

    #[error("Discovery failed: {0}")]
    DiscoveryError(String),

    #[error("{}", format_provider_error(.error, .description.as_deref()))]
    ProviderAuth {
        error: String,
        description: Option<String>,
    },

    #[error("State mismatch in authorization callback; the redirect was not issued for this login attempt")]
    StateMismatch,

    #[error("Token request rejected with status {status}: {body}")]
    Exchange { status: u16, body: String },

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Timed out waiting for the authorization callback after {}s", .0.as_secs())]
    CallbackTimeout(Duration),

    #[error("Cannot access token cache {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Token cache {} is corrupt: {source}", path.display())]
    CacheParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Token obtained but could not be cached: {source}")]
    TokenNotCached {
        path: PathBuf,
        access_token: String,
        source: Box<TokenkeeperError>,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn format_profile_not_found(name: &str, suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!("Profile '{name}' not found. Did you mean '{s}'?"),
        None => format!("Profile '{name}' not found."),
    }
}

fn format_provider_error(error: &str, description: Option<&str>) -> String {
    match description {
        Some(d) => format!("Identity provider returned '{error}': {d}"),
        None => format!("Identity provider returned '{error}'"),
    }
}

impl TokenkeeperError {
    /// Error code string for structured JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            TokenkeeperError::ConfigError { .. } => "config_error",
            TokenkeeperError::ProfileNotFound { .. } => "profile_not_found",
            TokenkeeperError::DiscoveryError(_) => "discovery_error",
            TokenkeeperError::ProviderAuth { .. } => "provider_error",
            TokenkeeperError::StateMismatch => "state_mismatch",
            TokenkeeperError::Exchange { .. } => "exchange_error",
            TokenkeeperError::HttpError(_) => "http_error",
            TokenkeeperError::CallbackTimeout(_) => "timeout",
            TokenkeeperError::CacheIo { .. } => "cache_io_error",
            TokenkeeperError::CacheParse { .. } => "cache_parse_error",
            TokenkeeperError::TokenNotCached { .. } => "cache_write_error",
            TokenkeeperError::IoError(_) => "io_error",
        }
    }

    /// The freshly obtained access token carried by a failed cache write.
    pub fn unpersisted_token(&self) -> Option<&str> {
        match self {
            TokenkeeperError::TokenNotCached { access_token, .. } => Some(access_token),
            _ => None,
        }
    }

    /// Produce a structured JSON error object. Never includes token material.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let TokenkeeperError::ProviderAuth { error, description } = self {
            obj.insert("providerError".into(), serde_json::Value::String(error.clone()));
            if let Some(d) = description {
                obj.insert("description".into(), serde_json::Value::String(d.clone()));
            }
        }
        if let TokenkeeperError::Exchange { status, .. } = self {
            obj.insert("status".into(), serde_json::Value::from(*status));
        }
        if let TokenkeeperError::TokenNotCached { path, .. } = self {
            obj.insert("path".into(), serde_json::Value::String(path.display().to_string()));
        }
        obj.insert("message".into(), serde_json::Value::String(self.to_string()));
        obj.insert("code".into(), serde_json::Value::String(self.code().to_string()));
        serde_json::json!({ "error": obj })
    }
}
